//! mailtriage llm - classification through an OpenAI-compatible chat service.
//!
//! This crate provides the HTTP client, the `CompletionBackend` seam used to
//! swap it out, and the classifier that runs the five per-message tasks and
//! turns their responses into typed results.

mod backend;
mod classifier;
mod client;
mod error;
pub mod parse;
pub mod prompts;
mod types;

pub use backend::CompletionBackend;
pub use classifier::{Classification, Classifier, ClassifierSettings};
pub use client::ChatClient;
pub use error::{LlmError, LlmResult};
pub use types::*;
