use crate::core::EntityId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Entity '{0}' not found")]
    EntityNotFound(EntityId),

    #[error("Entity '{0}' vanished before reconciliation")]
    ReconciliationConflict(EntityId),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
