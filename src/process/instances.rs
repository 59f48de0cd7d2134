use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::collection::{CollectionAccessor, SharedCollection};
use crate::config::CoordinatorConfig;
use crate::core::{Entity, EntityId, FlowError, Patch, Result};
use crate::optimistic::{CoordinatorStats, MutationError, OptimisticCoordinator, PendingMutation};
use crate::process::ProcessStatus;
use crate::process::status::STATUS_FIELD;
use crate::session::Session;
use crate::store::memory::CREATED_AT;
use crate::store::{EntityKind, ListQuery, RemoteStore, SortOrder};

pub const ASSIGNED_TO: &str = "assigned_to";

fn status_patch(status: ProcessStatus) -> Patch {
    Patch::new().set(STATUS_FIELD, status)
}

/// Remote confirmation of a status change.
pub type RemoteFuture = BoxFuture<'static, Result<Entity>>;

/// Local view of process instances, newest first.
pub struct ProcessInstances<S: RemoteStore> {
    store: Arc<S>,
    collection: SharedCollection,
    coordinator: OptimisticCoordinator<SharedCollection>,
    session: Session,
}

impl<S: RemoteStore + 'static> ProcessInstances<S> {
    pub fn new(store: Arc<S>, session: Session) -> Self {
        let collection = SharedCollection::new();
        let coordinator = OptimisticCoordinator::new(collection.clone());
        Self {
            store,
            collection,
            coordinator,
            session,
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Result<Self> {
        self.coordinator = self.coordinator.with_config(config)?;
        Ok(self)
    }

    pub fn collection(&self) -> &SharedCollection {
        &self.collection
    }

    pub fn instances(&self) -> Vec<Entity> {
        self.collection.to_vec()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.coordinator.stats()
    }

    /// Reloads the collection from the store. Returns the number loaded.
    pub async fn refresh(&self) -> Result<usize> {
        let entities = self
            .store
            .list(
                EntityKind::ProcessInstances,
                ListQuery::new().order_by(CREATED_AT, SortOrder::Desc),
            )
            .await?;

        let count = entities.len();
        self.collection.set(entities.into_iter().collect());
        info!(count, "process instances loaded");
        Ok(count)
    }

    /// Creates an instance remotely and prepends the stored result.
    ///
    /// New instances start `pendente` and are assigned to the current user
    /// unless `fields` says otherwise.
    pub async fn create(&self, fields: Patch) -> Result<Entity> {
        let mut fields = fields;
        if fields.get(STATUS_FIELD).is_none() {
            fields.insert(STATUS_FIELD, ProcessStatus::default());
        }
        if fields.get(ASSIGNED_TO).is_none() {
            fields.insert(ASSIGNED_TO, self.session.user_id.as_str());
        }

        let created = self
            .store
            .create(EntityKind::ProcessInstances, fields)
            .await?;
        self.collection.prepend(created.clone());
        Ok(created)
    }

    /// Applies the status locally and starts the remote update.
    ///
    /// The returned mutation must be settled (or dropped, which rolls back).
    pub fn begin_status_update(
        &self,
        id: impl Into<EntityId>,
        status: ProcessStatus,
    ) -> Result<PendingMutation<SharedCollection, RemoteFuture>> {
        let id = id.into();
        let patch = status_patch(status);
        let remote = self.remote_update(&id, &patch);
        self.coordinator.apply_optimistic(id, patch, remote)
    }

    /// Changes the status optimistically and waits for the store.
    ///
    /// On failure the collection is already rolled back when this returns.
    pub async fn update_status(
        &self,
        id: impl Into<EntityId>,
        status: ProcessStatus,
    ) -> std::result::Result<Entity, MutationError<FlowError>> {
        let id = id.into();
        let patch = status_patch(status);
        let remote = self.remote_update(&id, &patch);

        self.coordinator
            .mutate(id.clone(), patch, remote)
            .await
            .inspect_err(|err| {
                if let MutationError::RemoteOperationFailed(cause) = err {
                    warn!(entity_id = %id, error = %cause, "status update rejected");
                }
            })
    }

    fn remote_update(
        &self,
        id: &EntityId,
        patch: &Patch,
    ) -> impl FnOnce() -> RemoteFuture + use<S> {
        let store = Arc::clone(&self.store);
        let id = id.clone();
        let patch = patch.clone();
        move || {
            async move {
                store
                    .update(EntityKind::ProcessInstances, &id, patch)
                    .await
            }
            .boxed()
        }
    }

    /// Deletes remotely, then locally. Returns whether the store had it.
    pub async fn remove(&self, id: impl Into<EntityId>) -> Result<bool> {
        let id = id.into();
        let removed = self
            .store
            .delete(EntityKind::ProcessInstances, &id)
            .await?;
        self.collection.remove(&id);
        Ok(removed)
    }

    /// Instances per status, for dashboard cards. Unknown statuses are skipped.
    pub fn status_counts(&self) -> BTreeMap<ProcessStatus, usize> {
        let mut counts: BTreeMap<ProcessStatus, usize> =
            ProcessStatus::ALL.into_iter().map(|status| (status, 0)).collect();

        for entity in self.collection.get().iter() {
            let status = entity
                .field(STATUS_FIELD)
                .and_then(|value| value.as_str())
                .and_then(|value| value.parse::<ProcessStatus>().ok());
            if let Some(status) = status {
                *counts.entry(status).or_default() += 1;
            }
        }
        counts
    }
}
