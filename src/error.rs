use crate::models::TaskId;

/// Errors raised by the task store and the recycle-bin side store.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The id is not present in the store it was looked up in.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The remote task store could not be reached or answered with an error.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A request was rejected before reaching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Reading or writing the recycle-bin file failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TaskError {
    fn from(err: reqwest::Error) -> Self {
        TaskError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
