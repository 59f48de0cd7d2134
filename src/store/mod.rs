// ============================================================================
// Store Module
// ============================================================================
//
// The remote authority the coordinator confirms mutations against: a
// CRUD-per-kind data-access contract plus an in-memory mock with simulated
// latency and injectable failures.
//
// ============================================================================

use async_trait::async_trait;

use crate::core::{Entity, EntityId, Patch, Result};

pub mod kind;
pub mod memory;
pub mod query;

pub use kind::EntityKind;
pub use memory::MockStore;
pub use query::{ListQuery, SortOrder};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list(&self, kind: EntityKind, query: ListQuery) -> Result<Vec<Entity>>;
    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>>;
    async fn create(&self, kind: EntityKind, fields: Patch) -> Result<Entity>;
    /// Merges `patch` into the stored entity and returns the stored result.
    async fn update(&self, kind: EntityKind, id: &EntityId, patch: Patch) -> Result<Entity>;
    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool>;
}
