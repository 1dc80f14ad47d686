use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Permission, normalize_key};

type RawGrants = BTreeMap<String, BTreeMap<String, bool>>;

/// Module → (action → allowed) map.
///
/// Keys are stored normalised (lowercase), so lookups are case-insensitive.
/// An absent entry is *not* a denial: it means this source has no opinion and
/// resolution falls through to the next source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGrants", into = "RawGrants")]
pub struct PermissionSet {
    grants: RawGrants,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, permission: impl Into<Permission>) -> Self {
        self.set(permission.into(), true);
        self
    }

    pub fn deny(mut self, permission: impl Into<Permission>) -> Self {
        self.set(permission.into(), false);
        self
    }

    pub fn set(&mut self, permission: Permission, allowed: bool) {
        self.set_raw(permission.module().key(), permission.action_key(), allowed);
    }

    /// Record an entry by raw keys (as received from an admin UI or a file).
    pub fn set_raw(&mut self, module: &str, action: &str, allowed: bool) {
        self.grants
            .entry(normalize_key(module))
            .or_default()
            .insert(normalize_key(action), allowed);
    }

    /// The definitive answer of this source, if it has one.
    pub fn get(&self, permission: Permission) -> Option<bool> {
        self.grants
            .get(permission.module().key())
            .and_then(|actions| actions.get(permission.action_key()))
            .copied()
    }

    pub fn remove(&mut self, permission: Permission) -> Option<bool> {
        let actions = self.grants.get_mut(permission.module().key())?;
        let previous = actions.remove(permission.action_key());
        if actions.is_empty() {
            self.grants.remove(permission.module().key());
        }
        previous
    }

    pub fn is_empty(&self) -> bool {
        self.grants.values().all(|a| a.is_empty())
    }

    /// Number of explicit entries (grants and denials).
    pub fn len(&self) -> usize {
        self.grants.values().map(|a| a.len()).sum()
    }
}

impl From<RawGrants> for PermissionSet {
    fn from(raw: RawGrants) -> Self {
        let mut set = PermissionSet::new();
        for (module, actions) in raw {
            for (action, allowed) in actions {
                set.set_raw(&module, &action, allowed);
            }
        }
        set
    }
}

impl From<PermissionSet> for RawGrants {
    fn from(set: PermissionSet) -> Self {
        set.grants
    }
}

impl FromIterator<(Permission, bool)> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = (Permission, bool)>>(iter: I) -> Self {
        let mut set = PermissionSet::new();
        for (permission, allowed) in iter {
            set.set(permission, allowed);
        }
        set
    }
}
