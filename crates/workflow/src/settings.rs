use serde::{Deserialize, Serialize};

/// Business-level switches that shape the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSettings {
    /// Counter-signer and approver must differ from the first signer.
    pub enforce_unique_signers: bool,
    /// At most one assignee per workflow role.
    pub single_assignee_per_role: bool,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            enforce_unique_signers: true,
            single_assignee_per_role: false,
        }
    }
}
