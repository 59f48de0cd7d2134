// ============================================================================
// Collection Module
// ============================================================================
//
// In-memory state containers the optimistic coordinator reads and writes.
// The coordinator never owns storage; it is handed a CollectionAccessor.
//
// ============================================================================

pub mod accessor;
pub mod snapshot;

pub use accessor::{CollectionAccessor, SharedCollection};
pub use snapshot::CollectionSnapshot;
