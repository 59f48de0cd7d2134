use thiserror::Error;

use crate::core::{EntityId, FlowError};

/// Outcome error of a full optimistic mutation.
///
/// The remote error is carried as-is so callers can tell why a mutation
/// failed; by the time it is observed the collection has been rolled back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError<E> {
    #[error("Entity '{0}' not found")]
    EntityNotFound(EntityId),

    #[error(transparent)]
    RemoteOperationFailed(E),
}

impl<E> MutationError<E> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MutationError::EntityNotFound(_))
    }

    /// The remote error, if the mutation got as far as the remote call.
    pub fn into_remote(self) -> Option<E> {
        match self {
            MutationError::RemoteOperationFailed(err) => Some(err),
            MutationError::EntityNotFound(_) => None,
        }
    }
}

impl From<MutationError<FlowError>> for FlowError {
    fn from(err: MutationError<FlowError>) -> Self {
        match err {
            MutationError::EntityNotFound(id) => FlowError::EntityNotFound(id),
            MutationError::RemoteOperationFailed(err) => err,
        }
    }
}
