use thiserror::Error;

/// Failures talking to the todo backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// User-facing failures. Every variant is recoverable and renders as a
/// dismissible message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("Failed to fetch tasks: {0}")]
    FetchFailed(String),
    #[error("Failed to save task: {0}")]
    SaveFailed(String),
    #[error("Failed to delete task: {0}")]
    DeleteFailed(String),
    #[error("Task title cannot be empty.")]
    ValidationFailed,
}
