use serde::{Deserialize, Serialize};

use crate::core::EntityId;

/// The signed-in user, as far as mutations need to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: EntityId,
    pub display_name: String,
}

impl Session {
    pub fn new(user_id: impl Into<EntityId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::new("anonymous", "Anonymous")
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.as_str() == "anonymous"
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}
