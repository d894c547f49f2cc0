use serde::{Deserialize, Serialize};

/// Capabilities of the current user on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub can_evaluate: bool,
    #[serde(default)]
    pub can_edit_note: bool,
    #[serde(default)]
    pub can_edit_status: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            can_evaluate: true,
            can_edit_note: true,
            can_edit_status: true,
        }
    }

    /// Read-only access
    pub fn none() -> Self {
        Self {
            can_evaluate: false,
            can_edit_note: false,
            can_edit_status: false,
        }
    }
}
