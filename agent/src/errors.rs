use scheduler_core::GeminiError;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a controller operation
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Model call failed: {0}")]
    Model(#[from] GeminiError),

    #[error("Condensing the conversation failed: {0}")]
    Condensation(#[source] GeminiError),

    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },
}

impl AgentError {
    /// Whether sending the same message again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AgentError::Model(e) | AgentError::Condensation(e) => e.is_transient(),
            AgentError::Timeout { .. } => true,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
