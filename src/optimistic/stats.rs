use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between a coordinator and its pending mutations.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    applied: AtomicU64,
    confirmed: AtomicU64,
    rolled_back: AtomicU64,
    rejected: AtomicU64,
    conflicts: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_rolled_back(&self) {
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn snapshot(&self) -> CoordinatorStats {
        let applied = self.applied.load(Ordering::SeqCst);
        let confirmed = self.confirmed.load(Ordering::SeqCst);
        let rolled_back = self.rolled_back.load(Ordering::SeqCst);

        CoordinatorStats {
            applied,
            confirmed,
            rolled_back,
            rejected: self.rejected.load(Ordering::SeqCst),
            reconciliation_conflicts: self.conflicts.load(Ordering::SeqCst),
            in_flight: applied.saturating_sub(confirmed + rolled_back),
        }
    }
}

/// Point-in-time view of a coordinator's mutation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Mutations whose optimistic patch was applied
    pub applied: u64,
    pub confirmed: u64,
    /// Includes cancellations
    pub rolled_back: u64,
    /// Rejected before applying (entity not found)
    pub rejected: u64,
    /// Settlements that found their entity gone
    pub reconciliation_conflicts: u64,
    pub in_flight: u64,
}

impl std::fmt::Display for CoordinatorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mutation Stats: {} applied, {} confirmed, {} rolled back, {} rejected, {} conflicts, {} in flight",
            self.applied,
            self.confirmed,
            self.rolled_back,
            self.rejected,
            self.reconciliation_conflicts,
            self.in_flight
        )
    }
}
