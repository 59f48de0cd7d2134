use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{FlowError, Value};

pub const STATUS_FIELD: &str = "status";

/// Workflow stage of a process instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    #[default]
    Pendente,
    EmAndamento,
    Finalizado,
}

impl ProcessStatus {
    pub const ALL: [ProcessStatus; 3] = [
        ProcessStatus::Pendente,
        ProcessStatus::EmAndamento,
        ProcessStatus::Finalizado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Pendente => "pendente",
            ProcessStatus::EmAndamento => "em_andamento",
            ProcessStatus::Finalizado => "finalizado",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessStatus {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| FlowError::TypeMismatch(format!("unknown process status '{}'", s)))
    }
}

impl From<ProcessStatus> for Value {
    fn from(status: ProcessStatus) -> Self {
        Value::Text(status.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "em_andamento".parse::<ProcessStatus>().unwrap(),
            ProcessStatus::EmAndamento
        );
        assert!("arquivado".parse::<ProcessStatus>().is_err());
    }

    #[test]
    fn test_status_serde_matches_display() {
        for status in ProcessStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }
}
