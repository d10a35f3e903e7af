use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("plan {0} is not pending")]
    PlanNotPending(String),

    #[error("confirmation timed out after {0:?}")]
    ChannelTimeout(std::time::Duration),

    #[error("no connected client channel")]
    ChannelUnavailable,

    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    General(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
