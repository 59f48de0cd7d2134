// ============================================================================
// Process Module
// ============================================================================
//
// Licensing-process instances as the UI works with them: a local collection
// kept in step with the store, with status changes applied optimistically.
//
// ============================================================================

pub mod instances;
pub mod status;

pub use instances::{ProcessInstances, RemoteFuture};
pub use status::ProcessStatus;
