//! Access resolution.
//!
//! - No IO
//! - No panics
//! - Deterministic: a pure function of (user, permission, policy, safe mode)
//!
//! Resolution order, first definitive boolean wins:
//!
//! ```text
//! no user                      → deny
//! Owner / SuperAdmin           → allow
//! safe mode + "view" action    → allow
//! user.permissions             ─┐
//! policy.user_permissions      ─┤ explicit true/false
//! policy.role_permissions      ─┤
//! built-in template (no map)   ─┘
//! nothing matched              → deny
//! ```

use serde::Serialize;
use thiserror::Error;

use bazaar_core::UserId;

use crate::catalog::Permission;
use crate::policy::AccessPolicy;
use crate::templates::default_role_template;
use crate::user::User;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("access denied: {permission} (user: {user:?})")]
    AccessDenied {
        user: Option<UserId>,
        permission: String,
    },
}

/// Which source produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    NoUser,
    SuperRole,
    SafeMode,
    UserOverride,
    CentralUser,
    RoleDefault,
    FallbackTemplate,
    NoMatch,
}

/// Outcome of a resolution, with the deciding source for audit/debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub granted: bool,
    pub source: AccessSource,
}

impl AccessDecision {
    fn allow(source: AccessSource) -> Self {
        Self { granted: true, source }
    }

    fn deny(source: AccessSource) -> Self {
        Self { granted: false, source }
    }

    fn from_source(allowed: bool, source: AccessSource) -> Self {
        Self { granted: allowed, source }
    }
}

/// Resolve `permission` for `user` and report which source decided.
pub fn resolve_access(
    user: Option<&User>,
    permission: Permission,
    policy: &AccessPolicy,
    safe_mode: bool,
) -> AccessDecision {
    let Some(user) = user else {
        return AccessDecision::deny(AccessSource::NoUser);
    };

    if user.role.is_super() {
        return AccessDecision::allow(AccessSource::SuperRole);
    }

    if safe_mode && permission.is_view() {
        return AccessDecision::allow(AccessSource::SafeMode);
    }

    if let Some(allowed) = user.permissions.as_ref().and_then(|p| p.get(permission)) {
        return AccessDecision::from_source(allowed, AccessSource::UserOverride);
    }

    if let Some(allowed) = policy.user_map(user.id).and_then(|p| p.get(permission)) {
        return AccessDecision::from_source(allowed, AccessSource::CentralUser);
    }

    match policy.role_map() {
        Some(roles) => {
            if let Some(allowed) = roles.get(&user.role).and_then(|p| p.get(permission)) {
                return AccessDecision::from_source(allowed, AccessSource::RoleDefault);
            }
        }
        None => {
            if let Some(allowed) = default_role_template(user.role).get(permission) {
                return AccessDecision::from_source(allowed, AccessSource::FallbackTemplate);
            }
        }
    }

    AccessDecision::deny(AccessSource::NoMatch)
}

/// `true` iff `user` may perform `permission`.
pub fn has_access(
    user: Option<&User>,
    permission: Permission,
    policy: &AccessPolicy,
    safe_mode: bool,
) -> bool {
    resolve_access(user, permission, policy, safe_mode).granted
}

/// Boundary variant taking raw UI event names.
///
/// Keys outside the catalog always resolve to deny, for every role.
pub fn has_access_by_key(
    user: Option<&User>,
    module: &str,
    action: &str,
    policy: &AccessPolicy,
    safe_mode: bool,
) -> bool {
    match Permission::parse(module, action) {
        Some(permission) => has_access(user, permission, policy, safe_mode),
        None => {
            tracing::debug!(module, action, "unknown permission key; denying");
            false
        }
    }
}

/// Guard form of [`has_access`] for command boundaries.
pub fn authorize(
    user: Option<&User>,
    permission: Permission,
    policy: &AccessPolicy,
    safe_mode: bool,
) -> Result<(), AuthzError> {
    let decision = resolve_access(user, permission, policy, safe_mode);
    if decision.granted {
        return Ok(());
    }

    tracing::warn!(
        user_id = ?user.map(|u| u.id),
        permission = %permission,
        source = ?decision.source,
        "access denied"
    );
    Err(AuthzError::AccessDenied {
        user: user.map(|u| u.id),
        permission: permission.key(),
    })
}

/// Every catalog permission `user` resolves to `true` (for menus and toolbars).
pub fn effective_permissions(
    user: Option<&User>,
    policy: &AccessPolicy,
    safe_mode: bool,
) -> Vec<Permission> {
    Permission::all()
        .into_iter()
        .filter(|p| has_access(user, *p, policy, safe_mode))
        .collect()
}
