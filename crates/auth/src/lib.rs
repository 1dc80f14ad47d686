//! `bazaar-auth`: permission catalog and access resolution.
//!
//! Pure policy: no IO, no storage. The permission maps are injected through
//! [`AccessPolicy`]; nothing is read from ambient state.

pub mod authorize;
pub mod catalog;
pub mod permissions;
pub mod policy;
pub mod roles;
pub mod templates;
pub mod user;

pub use authorize::{
    AccessDecision, AccessSource, AuthzError, authorize, effective_permissions, has_access,
    has_access_by_key, resolve_access,
};
pub use catalog::{
    DashboardAction, FinanceAction, InventoryAction, Module, Permission, PurchasesAction,
    ReportsAction, SalesAction, SettingsAction, TreasuryAction, UsersAction, normalize_key,
};
pub use permissions::PermissionSet;
pub use policy::{AccessPolicy, PolicyError};
pub use roles::Role;
pub use templates::default_role_template;
pub use user::User;
