use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::normalize_key;

/// Business role of a user (distinct from workflow duties).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    SuperAdmin,
    Admin,
    Manager,
    Staff,
    Cashier,
    Investor,
    /// Holds nothing by default; everything comes from explicit maps.
    Custom,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Owner,
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::Staff,
        Role::Cashier,
        Role::Investor,
        Role::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
            Role::Cashier => "cashier",
            Role::Investor => "investor",
            Role::Custom => "custom",
        }
    }

    /// Hard-wired bypass of every access check. Not configurable.
    pub fn is_super(self) -> bool {
        matches!(self, Role::Owner | Role::SuperAdmin)
    }

    /// May manage workflow role assignments and stand in as author/approver.
    pub fn is_workflow_admin(self) -> bool {
        matches!(self, Role::Owner | Role::SuperAdmin | Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s).replace(['-', ' '], "_");
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == key)
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}
