// ============================================================================
// Mutation State Management
// ============================================================================
//
// Every optimistic mutation moves through a small state machine:
//
//   Idle ──entity found──> OptimisticallyApplied ──remote ok──> Confirmed
//     │                              │
//     │                              └──remote err / cancel──> RolledBack
//     └──entity missing──> Rejected
//
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{FlowError, Result};

static NEXT_MUTATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one `apply_optimistic` call, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(pub u64);

impl MutationId {
    pub fn new() -> Self {
        MutationId(NEXT_MUTATION_ID.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MutationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mut_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    /// Local patch visible, remote operation outstanding.
    OptimisticallyApplied,
    Confirmed,
    RolledBack,
    /// Entity was missing; nothing was applied.
    Rejected,
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::OptimisticallyApplied)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MutationState::Confirmed | MutationState::RolledBack | MutationState::Rejected
        )
    }

    /// Validates and performs a transition.
    pub fn transition(&mut self, next: MutationState) -> Result<()> {
        let allowed = matches!(
            (*self, next),
            (MutationState::Idle, MutationState::OptimisticallyApplied)
                | (MutationState::Idle, MutationState::Rejected)
                | (MutationState::OptimisticallyApplied, MutationState::Confirmed)
                | (MutationState::OptimisticallyApplied, MutationState::RolledBack)
        );

        if !allowed {
            return Err(FlowError::InvalidState(format!(
                "cannot move mutation from {} to {}",
                self, next
            )));
        }

        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for MutationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationState::Idle => write!(f, "IDLE"),
            MutationState::OptimisticallyApplied => write!(f, "OPTIMISTICALLY_APPLIED"),
            MutationState::Confirmed => write!(f, "CONFIRMED"),
            MutationState::RolledBack => write!(f, "ROLLED_BACK"),
            MutationState::Rejected => write!(f, "REJECTED"),
        }
    }
}
