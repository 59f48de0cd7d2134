// ============================================================================
// ProcessFlow Library
// ============================================================================

pub mod collection;
pub mod config;
pub mod core;
pub mod optimistic;
pub mod process;
pub mod session;
pub mod store;

// Re-export main types for convenience
pub use collection::{CollectionAccessor, CollectionSnapshot, SharedCollection};
pub use config::{AppConfig, CoordinatorConfig, RollbackPolicy, StoreConfig};
pub use crate::core::{Entity, EntityId, FlowError, Patch, Result, Value};
pub use optimistic::{
    CoordinatorStats, MergeStrategy, MutationError, MutationId, MutationState,
    OptimisticCoordinator, PendingMutation, ShallowMerge,
};
pub use process::{ProcessInstances, ProcessStatus};
pub use session::Session;
pub use store::{EntityKind, ListQuery, MockStore, RemoteStore, SortOrder};
