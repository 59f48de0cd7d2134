// ============================================================================
// Optimistic Mutation Coordinator
// ============================================================================
//
// apply_optimistic: snapshot, merge the patch in place, hand back a
// PendingMutation. settle: await the remote exactly once, then either
// replace the entity with the authoritative one or roll back.
//
// Snapshot capture and patch application never suspend, so a reader can
// only ever see the pre-mutation or the optimistic collection, never a torn
// one. The only suspension point is the remote await.
//
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use tracing::{Level, Span, event, info_span};

use crate::collection::accessor::position_of;
use crate::collection::{CollectionAccessor, CollectionSnapshot};
use crate::config::{CoordinatorConfig, RollbackPolicy};
use crate::core::{Entity, EntityId, FlowError, Patch, Result};
use crate::optimistic::stats::StatsCounters;
use crate::optimistic::{
    CoordinatorStats, MergeStrategy, MutationError, MutationId, MutationState, ShallowMerge,
};

/// Applies mutations locally before a remote authority confirms them.
///
/// # Examples
///
/// ```
/// use processflow::{Entity, OptimisticCoordinator, Patch, SharedCollection};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let collection = SharedCollection::from_entities(vec![
///     Entity::new(1).with_field("status", "pendente"),
/// ]);
/// let coordinator = OptimisticCoordinator::new(collection.clone());
///
/// let pending = coordinator
///     .apply_optimistic(1, Patch::new().set("status", "finalizado"), || async {
///         Err::<Entity, _>("network error")
///     })
///     .unwrap();
/// assert_eq!(collection.find(&1.into()).unwrap().field("status").unwrap().as_str(), Some("finalizado"));
///
/// assert_eq!(pending.settle().await, Err("network error"));
/// assert_eq!(collection.find(&1.into()).unwrap().field("status").unwrap().as_str(), Some("pendente"));
/// # }
/// ```
pub struct OptimisticCoordinator<A, M = ShallowMerge> {
    accessor: A,
    merge: M,
    config: CoordinatorConfig,
    stats: Arc<StatsCounters>,
}

impl<A> OptimisticCoordinator<A, ShallowMerge>
where
    A: CollectionAccessor + Clone,
{
    pub fn new(accessor: A) -> Self {
        Self::with_merge(accessor, ShallowMerge)
    }
}

impl<A, M> OptimisticCoordinator<A, M>
where
    A: CollectionAccessor + Clone,
    M: MergeStrategy,
{
    pub fn with_merge(accessor: A, merge: M) -> Self {
        Self {
            accessor,
            merge,
            config: CoordinatorConfig::default(),
            stats: Arc::new(StatsCounters::default()),
        }
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats.snapshot()
    }

    /// Applies `patch` to the entity locally and prepares the remote call.
    ///
    /// On return the collection already shows the optimistic entity. The
    /// remote future is created here but only driven by
    /// [`PendingMutation::settle`].
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if `entity_id` is not in the collection. Nothing is
    /// changed and `remote` is never called.
    pub fn apply_optimistic<F, Fut, E>(
        &self,
        entity_id: impl Into<EntityId>,
        patch: Patch,
        remote: F,
    ) -> Result<PendingMutation<A, Fut>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Entity, E>>,
    {
        self.prepare(entity_id.into(), patch, remote)
            .map_err(FlowError::EntityNotFound)
    }

    /// Applies, then settles: the whole mutation in one call.
    pub async fn mutate<F, Fut, E>(
        &self,
        entity_id: impl Into<EntityId>,
        patch: Patch,
        remote: F,
    ) -> std::result::Result<Entity, MutationError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Entity, E>>,
    {
        let pending = self
            .prepare(entity_id.into(), patch, remote)
            .map_err(MutationError::EntityNotFound)?;

        pending
            .settle()
            .await
            .map_err(MutationError::RemoteOperationFailed)
    }

    fn prepare<F, Fut, E>(
        &self,
        entity_id: EntityId,
        patch: Patch,
        remote: F,
    ) -> std::result::Result<PendingMutation<A, Fut>, EntityId>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Entity, E>>,
    {
        let mutation_id = MutationId::new();
        let span = info_span!(
            "optimistic.mutation",
            mutation = %mutation_id,
            collection = %self.config.collection,
            entity_id = %entity_id
        );
        let enter = span.enter();

        let applied = self.accessor.update(|entries| {
            let index = position_of(entries, &entity_id)?;
            let snapshot = CollectionSnapshot::from_entries(entries.clone());
            let optimistic = self.merge.merge(&entries[index], &patch);
            entries.set(index, optimistic.clone());
            Some((snapshot, optimistic))
        });
        let Some((snapshot, optimistic)) = applied else {
            self.stats.record_rejected();
            event!(Level::DEBUG, "optimistic mutation rejected: entity not found");
            return Err(entity_id);
        };

        self.stats.record_applied();
        event!(Level::DEBUG, fields = patch.len(), "optimistic patch applied");
        drop(enter);

        let guard = MutationGuard {
            mutation_id,
            entity_id,
            snapshot,
            optimistic,
            accessor: self.accessor.clone(),
            policy: self.config.rollback_policy,
            stats: Arc::clone(&self.stats),
            state: MutationState::OptimisticallyApplied,
            span,
        };

        Ok(PendingMutation {
            guard,
            remote: remote(),
        })
    }
}

/// An applied optimistic patch waiting for its remote confirmation.
///
/// Dropping it before [`settle`](Self::settle) completes cancels the
/// mutation, which is handled exactly like a remote failure.
#[must_use = "an unsettled mutation is rolled back when dropped"]
pub struct PendingMutation<A: CollectionAccessor, Fut> {
    guard: MutationGuard<A>,
    remote: Fut,
}

impl<A, Fut, E> PendingMutation<A, Fut>
where
    A: CollectionAccessor,
    Fut: Future<Output = std::result::Result<Entity, E>>,
{
    pub fn id(&self) -> MutationId {
        self.guard.mutation_id
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.guard.entity_id
    }

    pub fn state(&self) -> MutationState {
        self.guard.state
    }

    /// The entity as applied locally.
    pub fn optimistic(&self) -> &Entity {
        &self.guard.optimistic
    }

    /// The collection as it was before the patch.
    pub fn snapshot(&self) -> &CollectionSnapshot {
        &self.guard.snapshot
    }

    /// Awaits the remote operation and reconciles.
    ///
    /// On success the entity is replaced by the authoritative one in the
    /// current collection. On failure the collection is rolled back first,
    /// then the remote error is returned unchanged.
    pub async fn settle(self) -> std::result::Result<Entity, E> {
        let PendingMutation { mut guard, remote } = self;

        match remote.await {
            Ok(authoritative) => {
                guard.confirm(&authoritative);
                Ok(authoritative)
            }
            Err(err) => {
                guard.roll_back("remote operation failed");
                Err(err)
            }
        }
    }
}

/// Owns the bookkeeping for one mutation; rolls back if dropped unsettled.
struct MutationGuard<A: CollectionAccessor> {
    mutation_id: MutationId,
    entity_id: EntityId,
    snapshot: CollectionSnapshot,
    optimistic: Entity,
    accessor: A,
    policy: RollbackPolicy,
    stats: Arc<StatsCounters>,
    state: MutationState,
    span: Span,
}

impl<A: CollectionAccessor> MutationGuard<A> {
    fn confirm(&mut self, authoritative: &Entity) {
        let _enter = self.span.enter();
        if !advance(&mut self.state, MutationState::Confirmed) {
            return;
        }

        if replace_entity(&self.accessor, &self.entity_id, authoritative.clone()) {
            event!(Level::DEBUG, "optimistic mutation confirmed");
        } else {
            self.stats.record_conflict();
            event!(
                Level::WARN,
                "entity vanished before confirmation; reconciliation skipped"
            );
        }
        self.stats.record_confirmed();
    }

    fn roll_back(&mut self, reason: &'static str) {
        let _enter = self.span.enter();
        if !advance(&mut self.state, MutationState::RolledBack) {
            return;
        }

        match self.policy {
            RollbackPolicy::Snapshot => self.snapshot.restore(&self.accessor),
            RollbackPolicy::EntityOnly => {
                let restored = self
                    .snapshot
                    .entity(&self.entity_id)
                    .cloned()
                    .is_some_and(|original| {
                        replace_entity(&self.accessor, &self.entity_id, original)
                    });
                if !restored {
                    self.stats.record_conflict();
                    event!(
                        Level::WARN,
                        "entity vanished before rollback; nothing to restore"
                    );
                }
            }
        }

        self.stats.record_rolled_back();
        event!(
            Level::INFO,
            reason,
            policy = %self.policy,
            "optimistic mutation rolled back"
        );
    }
}

/// Swaps `entity` in at the current position of `id` in one atomic edit.
fn replace_entity<A: CollectionAccessor>(accessor: &A, id: &EntityId, entity: Entity) -> bool {
    accessor.update(|entries| match position_of(entries, id) {
        Some(index) => {
            entries.set(index, entity);
            true
        }
        None => false,
    })
}

fn advance(state: &mut MutationState, next: MutationState) -> bool {
    match state.transition(next) {
        Ok(()) => true,
        Err(err) => {
            event!(Level::ERROR, error = %err, "mutation settled twice");
            false
        }
    }
}

impl<A: CollectionAccessor> Drop for MutationGuard<A> {
    fn drop(&mut self) {
        if self.state.is_pending() {
            self.roll_back("cancelled before settlement");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::SharedCollection;

    fn collection() -> SharedCollection {
        SharedCollection::from_entities(vec![
            Entity::new(1).with_field("status", "pendente"),
            Entity::new(2).with_field("status", "em_andamento"),
        ])
    }

    #[test]
    fn test_apply_is_synchronous() {
        let collection = collection();
        let coordinator = OptimisticCoordinator::new(collection.clone());

        let pending = coordinator
            .apply_optimistic(1, Patch::new().set("status", "finalizado"), || {
                std::future::pending::<std::result::Result<Entity, String>>()
            })
            .unwrap();

        assert_eq!(pending.state(), MutationState::OptimisticallyApplied);
        assert_eq!(collection.find(&EntityId::from(1)).unwrap(), pending.optimistic().clone());
        assert_eq!(coordinator.stats().in_flight, 1);
    }

    #[test]
    fn test_drop_rolls_back() {
        let collection = collection();
        let before = collection.get();
        let coordinator = OptimisticCoordinator::new(collection.clone());

        let pending = coordinator
            .apply_optimistic(2, Patch::new().set("status", "finalizado"), || {
                std::future::pending::<std::result::Result<Entity, String>>()
            })
            .unwrap();
        drop(pending);

        assert_eq!(collection.get(), before);
        let stats = coordinator.stats();
        assert_eq!(stats.rolled_back, 1);
        assert_eq!(stats.in_flight, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = OptimisticCoordinator::new(collection()).with_config(CoordinatorConfig::new(""));
        assert!(matches!(result, Err(FlowError::InvalidConfig(_))));
    }
}
