use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};

use crate::core::{FlowError, Result};

/// What a failed or cancelled mutation restores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Replace the whole collection with the pre-mutation snapshot. Any other
    /// write that landed during the mutation window is discarded with it.
    #[default]
    Snapshot,
    /// Put back only the mutated entity, at its current position. Other
    /// entities keep whatever state they reached in the meantime.
    EntityOnly,
}

impl fmt::Display for RollbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackPolicy::Snapshot => write!(f, "snapshot"),
            RollbackPolicy::EntityOnly => write!(f, "entity"),
        }
    }
}

impl FromStr for RollbackPolicy {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(RollbackPolicy::Snapshot),
            "entity" | "entity_only" => Ok(RollbackPolicy::EntityOnly),
            other => Err(FlowError::InvalidConfig(format!(
                "unknown rollback policy '{}' (expected 'snapshot' or 'entity')",
                other
            ))),
        }
    }
}

/// Optimistic coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Collection name, used as a log field
    pub collection: String,

    /// Rollback behaviour on remote failure
    pub rollback_policy: RollbackPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new("collection")
    }
}

impl CoordinatorConfig {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            rollback_policy: RollbackPolicy::Snapshot,
        }
    }

    pub fn rollback_policy(mut self, policy: RollbackPolicy) -> Self {
        self.rollback_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(FlowError::InvalidConfig(
                "collection name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mock store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Simulated round-trip latency applied to every remote call
    pub latency: Duration,

    /// Upper bound on rows returned by an unbounded list
    pub max_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            max_page_size: 1000,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_page_size(mut self, max: usize) -> Self {
        self.max_page_size = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size == 0 {
            return Err(FlowError::InvalidConfig(
                "max_page_size must be > 0".to_string(),
            ));
        }
        if self.latency > Duration::from_secs(60) {
            return Err(FlowError::InvalidConfig(
                "latency above 60s is not a useful simulation".to_string(),
            ));
        }
        Ok(())
    }
}

/// Binary configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub rollback_policy: RollbackPolicy,
}

impl AppConfig {
    pub fn from_env() -> AnyResult<Self> {
        let latency_ms = env_string("PROCESSFLOW_LATENCY_MS", "150")
            .parse::<u64>()
            .context("PROCESSFLOW_LATENCY_MS must be a whole number of milliseconds")?;

        let rollback_policy = env_string("PROCESSFLOW_ROLLBACK", "snapshot")
            .parse::<RollbackPolicy>()
            .context("PROCESSFLOW_ROLLBACK must be 'snapshot' or 'entity'")?;

        let store = StoreConfig::new().latency(Duration::from_millis(latency_ms));
        store.validate().context("invalid store configuration")?;

        Ok(Self {
            store,
            rollback_policy,
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_policy_parse() {
        assert_eq!(
            "snapshot".parse::<RollbackPolicy>().unwrap(),
            RollbackPolicy::Snapshot
        );
        assert_eq!(
            " Entity ".parse::<RollbackPolicy>().unwrap(),
            RollbackPolicy::EntityOnly
        );
        assert!("partial".parse::<RollbackPolicy>().is_err());
    }

    #[test]
    fn test_coordinator_config_builder() {
        let config =
            CoordinatorConfig::new("process_instances").rollback_policy(RollbackPolicy::EntityOnly);
        assert_eq!(config.rollback_policy, RollbackPolicy::EntityOnly);
        assert!(config.validate().is_ok());
        assert!(CoordinatorConfig::new("  ").validate().is_err());
    }

    #[test]
    fn test_store_config_validate() {
        assert!(StoreConfig::new().validate().is_ok());
        assert!(StoreConfig::new().max_page_size(0).validate().is_err());
        assert!(
            StoreConfig::new()
                .latency(Duration::from_secs(120))
                .validate()
                .is_err()
        );
    }
}
