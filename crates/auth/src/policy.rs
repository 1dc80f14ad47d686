use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

use crate::permissions::PermissionSet;
use crate::roles::Role;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("malformed access policy: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Centrally configured permission maps, injected into the resolver.
///
/// - `user_permissions`: admin-editable per-user overrides (second priority,
///   after the map carried on the [`User`](crate::User) itself).
/// - `role_permissions`: per-role defaults. `None` means "not configured", in
///   which case the built-in templates apply. A configured map that lacks a
///   role does *not* fall back to the template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub user_permissions: BTreeMap<UserId, PermissionSet>,
    #[serde(default)]
    pub role_permissions: Option<BTreeMap<Role, PermissionSet>>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_user(mut self, user_id: UserId, permissions: PermissionSet) -> Self {
        self.user_permissions.insert(user_id, permissions);
        self
    }

    pub fn with_role(mut self, role: Role, permissions: PermissionSet) -> Self {
        self.role_permissions
            .get_or_insert_with(BTreeMap::new)
            .insert(role, permissions);
        self
    }

    pub fn user_map(&self, user_id: UserId) -> Option<&PermissionSet> {
        self.user_permissions.get(&user_id)
    }

    /// `None` when no role map is configured at all.
    pub fn role_map(&self) -> Option<&BTreeMap<Role, PermissionSet>> {
        self.role_permissions.as_ref()
    }
}
