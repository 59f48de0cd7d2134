// ============================================================================
// Optimistic Mutation Module
// ============================================================================
//
// Applies a mutation to an in-memory collection before a remote authority
// confirms it, then reconciles with the authoritative entity or rolls back.
// A collection never keeps a patch whose remote operation failed.
//
// ============================================================================

pub mod coordinator;
pub mod error;
pub mod merge;
pub mod state;
mod stats;

pub use coordinator::{OptimisticCoordinator, PendingMutation};
pub use error::MutationError;
pub use merge::{MergeStrategy, ShallowMerge};
pub use state::{MutationId, MutationState};
pub use stats::CoordinatorStats;
