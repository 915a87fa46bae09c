//! mailtriage core - domain types shared by the ingestion pipeline.

mod types;

pub use types::*;
