use thiserror::Error;

/// Errors raised by a calendar backend
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Calendar backend error: {0}")]
    Backend(String),
}

/// Errors raised while executing an action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Tool '{0}' not found.")]
    Unknown(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),
}
