//! Workflow role assignments: which users hold which approval duty.
//!
//! The registry is advisory data. It performs no transition logic; the approval
//! engine reads it through [`RoleDirectory`] to authorize each step.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use bazaar_auth::{Role, User};
use bazaar_core::UserId;

use crate::settings::BusinessSettings;

/// An abstract duty within one document type's workflow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowRoleKey {
    CashCounter,
    CashVerifier,
    CashApprover,
    CostingManager,
    CostingVerifier,
    CostingApprover,
    ReceivingClerk,
    ReceivingVerifier,
    ReceivingApprover,
}

impl WorkflowRoleKey {
    pub const ALL: &'static [WorkflowRoleKey] = &[
        WorkflowRoleKey::CashCounter,
        WorkflowRoleKey::CashVerifier,
        WorkflowRoleKey::CashApprover,
        WorkflowRoleKey::CostingManager,
        WorkflowRoleKey::CostingVerifier,
        WorkflowRoleKey::CostingApprover,
        WorkflowRoleKey::ReceivingClerk,
        WorkflowRoleKey::ReceivingVerifier,
        WorkflowRoleKey::ReceivingApprover,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowRoleKey::CashCounter => "cashCounter",
            WorkflowRoleKey::CashVerifier => "cashVerifier",
            WorkflowRoleKey::CashApprover => "cashApprover",
            WorkflowRoleKey::CostingManager => "costingManager",
            WorkflowRoleKey::CostingVerifier => "costingVerifier",
            WorkflowRoleKey::CostingApprover => "costingApprover",
            WorkflowRoleKey::ReceivingClerk => "receivingClerk",
            WorkflowRoleKey::ReceivingVerifier => "receivingVerifier",
            WorkflowRoleKey::ReceivingApprover => "receivingApprover",
        }
    }
}

impl core::fmt::Display for WorkflowRoleKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub user_id: UserId,
    pub assigned_by: UserId,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("role {role} may not manage workflow assignments")]
    NotPermitted { role: Role },

    #[error("{key} already has an assignee")]
    AssignmentLimitReached { key: WorkflowRoleKey },
}

/// Failure to consult the role directory. Always worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("role directory did not answer within {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    #[error("role directory unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the assignments, as consumed by the approval engine.
pub trait RoleDirectory: Send + Sync {
    fn is_assigned(&self, key: WorkflowRoleKey, user_id: UserId) -> Result<bool, DirectoryError>;

    fn roles_of(&self, user_id: UserId) -> Result<Vec<WorkflowRoleKey>, DirectoryError>;
}

impl<T> RoleDirectory for std::sync::Arc<T>
where
    T: RoleDirectory + ?Sized,
{
    fn is_assigned(&self, key: WorkflowRoleKey, user_id: UserId) -> Result<bool, DirectoryError> {
        (**self).is_assigned(key, user_id)
    }

    fn roles_of(&self, user_id: UserId) -> Result<Vec<WorkflowRoleKey>, DirectoryError> {
        (**self).roles_of(user_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRoleRegistry {
    /// Taken from [`BusinessSettings`]; not part of the persisted assignments.
    #[serde(skip)]
    single_assignee_per_role: bool,
    #[serde(default)]
    assignments: BTreeMap<WorkflowRoleKey, Vec<AssignmentRecord>>,
}

impl WorkflowRoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry honouring the business-level assignment limit.
    pub fn with_settings(settings: &BusinessSettings) -> Self {
        Self {
            single_assignee_per_role: settings.single_assignee_per_role,
            ..Self::default()
        }
    }

    /// Re-apply settings after they change, or after loading persisted assignments.
    pub fn apply_settings(&mut self, settings: &BusinessSettings) {
        self.single_assignee_per_role = settings.single_assignee_per_role;
    }

    pub fn single_assignee_per_role(&self) -> bool {
        self.single_assignee_per_role
    }

    /// Grant `key` to `user_id`.
    ///
    /// Assigning a user who already holds the duty returns the existing record.
    pub fn assign(
        &mut self,
        key: WorkflowRoleKey,
        user_id: UserId,
        assigned_by: &User,
    ) -> Result<AssignmentRecord, RegistryError> {
        ensure_admin(assigned_by)?;

        let holders = self.assignments.entry(key).or_default();
        if let Some(existing) = holders.iter().find(|r| r.user_id == user_id) {
            return Ok(existing.clone());
        }
        if self.single_assignee_per_role && !holders.is_empty() {
            warn!(%key, %user_id, "workflow role already has its single assignee");
            return Err(RegistryError::AssignmentLimitReached { key });
        }

        let record = AssignmentRecord {
            user_id,
            assigned_by: assigned_by.id,
            assigned_at: Utc::now(),
        };
        holders.push(record.clone());
        info!(%key, %user_id, assigned_by = %assigned_by.id, "workflow role assigned");
        Ok(record)
    }

    /// Remove `user_id` from `key`. Returns whether anything was removed.
    pub fn unassign(
        &mut self,
        key: WorkflowRoleKey,
        user_id: UserId,
        by: &User,
    ) -> Result<bool, RegistryError> {
        ensure_admin(by)?;

        let Some(holders) = self.assignments.get_mut(&key) else {
            return Ok(false);
        };
        let before = holders.len();
        holders.retain(|r| r.user_id != user_id);
        let removed = holders.len() != before;
        if holders.is_empty() {
            self.assignments.remove(&key);
        }
        if removed {
            info!(%key, %user_id, by = %by.id, "workflow role unassigned");
        }
        Ok(removed)
    }

    pub fn list_assignees(&self, key: WorkflowRoleKey) -> BTreeSet<UserId> {
        self.assignments(key).iter().map(|r| r.user_id).collect()
    }

    pub fn assignments(&self, key: WorkflowRoleKey) -> &[AssignmentRecord] {
        self.assignments.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_assigned(&self, key: WorkflowRoleKey, user_id: UserId) -> bool {
        self.assignments(key).iter().any(|r| r.user_id == user_id)
    }

    /// Every duty `user_id` holds, in key order.
    pub fn roles_of(&self, user_id: UserId) -> Vec<WorkflowRoleKey> {
        self.assignments
            .iter()
            .filter(|(_, holders)| holders.iter().any(|r| r.user_id == user_id))
            .map(|(key, _)| *key)
            .collect()
    }
}

impl RoleDirectory for WorkflowRoleRegistry {
    fn is_assigned(&self, key: WorkflowRoleKey, user_id: UserId) -> Result<bool, DirectoryError> {
        Ok(WorkflowRoleRegistry::is_assigned(self, key, user_id))
    }

    fn roles_of(&self, user_id: UserId) -> Result<Vec<WorkflowRoleKey>, DirectoryError> {
        Ok(WorkflowRoleRegistry::roles_of(self, user_id))
    }
}

fn ensure_admin(user: &User) -> Result<(), RegistryError> {
    if user.role.is_workflow_admin() {
        Ok(())
    } else {
        warn!(user_id = %user.id, role = %user.role, "workflow assignment change refused");
        Err(RegistryError::NotPermitted { role: user.role })
    }
}
