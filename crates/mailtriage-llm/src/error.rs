//! Error types for classification service operations.

use mailtriage_core::ClassificationTask;
use thiserror::Error;

/// Errors that can occur when talking to the classification service.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Unable to reach the service.
    #[error("Classification service unreachable at {host}")]
    ServerUnreachable { host: String },

    /// Request timeout.
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// The service rejected the credential.
    #[error("Unauthorized (status {status}): check the API key")]
    Unauthorized { status: u16 },

    /// The service is throttling us.
    #[error("Rate limited by the classification service: {message}")]
    RateLimited { message: String },

    /// The requested model is not available.
    #[error("Model not found: {model}")]
    ModelNotFound { model: String },

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response carried no completion.
    #[error("Empty response for task {task}")]
    EmptyResponse { task: ClassificationTask },

    /// A structured task returned a payload that does not fit its shape.
    #[error("Malformed {task} response: {message}")]
    MalformedResponse {
        task: ClassificationTask,
        message: String,
    },

    /// A request failed while running a specific task.
    #[error("Task {task} failed: {source}")]
    TaskFailed {
        task: ClassificationTask,
        #[source]
        source: Box<LlmError>,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request limiter was shut down.
    #[error("Request limiter closed")]
    LimiterClosed,

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::ServerUnreachable { .. }
            | LlmError::Timeout { .. }
            | LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The classification task this error belongs to, when known.
    pub fn task(&self) -> Option<ClassificationTask> {
        match self {
            LlmError::EmptyResponse { task }
            | LlmError::MalformedResponse { task, .. }
            | LlmError::TaskFailed { task, .. } => Some(*task),
            _ => None,
        }
    }

    /// Attach task context unless the error already carries it.
    pub fn for_task(self, task: ClassificationTask) -> Self {
        if self.task().is_some() {
            self
        } else {
            LlmError::TaskFailed {
                task,
                source: Box::new(self),
            }
        }
    }
}

/// Result type for classification service operations.
pub type LlmResult<T> = Result<T, LlmError>;
