use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::FlowError;

/// The record families ProcessFlow keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ProcessInstances,
    Appointments,
    Accounts,
    Contacts,
    Categories,
    Transactions,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::ProcessInstances,
        EntityKind::Appointments,
        EntityKind::Accounts,
        EntityKind::Contacts,
        EntityKind::Categories,
        EntityKind::Transactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ProcessInstances => "process_instances",
            EntityKind::Appointments => "appointments",
            EntityKind::Accounts => "accounts",
            EntityKind::Contacts => "contacts",
            EntityKind::Categories => "categories",
            EntityKind::Transactions => "transactions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| FlowError::InvalidConfig(format!("unknown entity kind '{}'", s)))
    }
}
