use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::core::{Entity, EntityId, FlowError, Patch, Result};
use crate::optimistic::{MergeStrategy, ShallowMerge};
use crate::store::{EntityKind, ListQuery, RemoteStore};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// In-memory stand-in for the remote backend.
///
/// Every call waits out the configured latency, then consumes one injected
/// failure if any are queued.
#[derive(Debug, Default)]
pub struct MockStore {
    tables: RwLock<HashMap<EntityKind, Vec<Entity>>>,
    config: StoreConfig,
    injected_failures: Mutex<VecDeque<String>>,
    calls: AtomicU64,
}

impl MockStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replaces the contents of `kind` with `entities`, kept in the given order.
    pub async fn seed(&self, kind: EntityKind, entities: impl IntoIterator<Item = Entity>) {
        let entities: Vec<Entity> = entities.into_iter().collect();
        debug!("seeding {} with {} entities", kind, entities.len());
        self.tables.write().await.insert(kind, entities);
    }

    /// Makes the next `count` calls fail with a generic network error.
    pub fn fail_next(&self, count: usize) {
        for _ in 0..count {
            self.fail_next_with("network error");
        }
    }

    /// Makes the next call fail with `message`.
    pub fn fail_next_with(&self, message: impl Into<String>) {
        self.failures().push_back(message.into());
    }

    /// Number of calls that reached the store, failed or not.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn round_trip(&self, operation: &str, kind: EntityKind) -> Result<()> {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let injected = self.failures().pop_front();
        if let Some(message) = injected {
            warn!("injected failure: op='{}' kind='{}' error='{}'", operation, kind, message);
            return Err(FlowError::Remote(message));
        }
        Ok(())
    }

    fn failures(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        self.injected_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn list(&self, kind: EntityKind, query: ListQuery) -> Result<Vec<Entity>> {
        self.round_trip("list", kind).await?;
        let rows = self
            .tables
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        query.apply(rows, self.config.max_page_size)
    }

    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>> {
        self.round_trip("get", kind).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&kind)
            .and_then(|rows| rows.iter().find(|entity| entity.id() == id))
            .cloned())
    }

    async fn create(&self, kind: EntityKind, fields: Patch) -> Result<Entity> {
        self.round_trip("create", kind).await?;

        let timestamp = now();
        let created = ShallowMerge
            .merge(&Entity::new(EntityId::generate()), &fields)
            .with_field(CREATED_AT, timestamp.clone())
            .with_field(UPDATED_AT, timestamp);

        self.tables
            .write()
            .await
            .entry(kind)
            .or_default()
            .insert(0, created.clone());
        debug!("created {}:{}", kind, created.id());
        Ok(created)
    }

    async fn update(&self, kind: EntityKind, id: &EntityId, patch: Patch) -> Result<Entity> {
        self.round_trip("update", kind).await?;

        let mut tables = self.tables.write().await;
        let stored = tables
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|entity| entity.id() == id))
            .ok_or_else(|| FlowError::EntityNotFound(id.clone()))?;

        *stored = ShallowMerge.merge(stored, &patch).with_field(UPDATED_AT, now());
        debug!("updated {}:{}", kind, id);
        Ok(stored.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<bool> {
        self.round_trip("delete", kind).await?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&kind) else {
            return Ok(false);
        };
        let before = rows.len();
        rows.retain(|entity| entity.id() != id);
        Ok(rows.len() != before)
    }
}
