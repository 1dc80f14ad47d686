//! Shared, lock-guarded workflow role registry.
//!
//! Reads give up after a bounded wait so a stuck writer surfaces as a retryable
//! error instead of a hung transition.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::warn;

use bazaar_auth::User;
use bazaar_core::UserId;
use bazaar_workflow::{
    AssignmentRecord, BusinessSettings, DirectoryError, RoleDirectory, WorkflowRoleKey,
    WorkflowRoleRegistry,
};

use crate::config::EngineConfig;
use crate::error::ApprovalError;

#[derive(Debug, Clone)]
pub struct SharedRoleRegistry {
    inner: Arc<RwLock<WorkflowRoleRegistry>>,
    timeout: Duration,
}

impl SharedRoleRegistry {
    pub fn new(registry: WorkflowRoleRegistry, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
            timeout,
        }
    }

    /// Empty registry with the configured assignment limit and lookup timeout.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            WorkflowRoleRegistry::with_settings(&config.settings),
            config.registry_timeout(),
        )
    }

    /// Push changed business settings into the live registry.
    pub fn apply_settings(&self, settings: &BusinessSettings) -> Result<(), DirectoryError> {
        self.write(|r| r.apply_settings(settings))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn waited_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn read<T>(&self, f: impl FnOnce(&WorkflowRoleRegistry) -> T) -> Result<T, DirectoryError> {
        match self.inner.try_read_for(self.timeout) {
            Some(guard) => Ok(f(&guard)),
            None => {
                warn!(waited_ms = self.waited_ms(), "workflow role registry read timed out");
                Err(DirectoryError::Timeout { waited_ms: self.waited_ms() })
            }
        }
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut WorkflowRoleRegistry) -> T,
    ) -> Result<T, DirectoryError> {
        match self.inner.try_write_for(self.timeout) {
            Some(mut guard) => Ok(f(&mut guard)),
            None => {
                warn!(waited_ms = self.waited_ms(), "workflow role registry write timed out");
                Err(DirectoryError::Timeout { waited_ms: self.waited_ms() })
            }
        }
    }

    pub fn assign(
        &self,
        key: WorkflowRoleKey,
        user_id: UserId,
        assigned_by: &User,
    ) -> Result<AssignmentRecord, ApprovalError> {
        self.write(|r| r.assign(key, user_id, assigned_by))?
            .map_err(ApprovalError::from)
    }

    pub fn unassign(
        &self,
        key: WorkflowRoleKey,
        user_id: UserId,
        by: &User,
    ) -> Result<bool, ApprovalError> {
        self.write(|r| r.unassign(key, user_id, by))?
            .map_err(ApprovalError::from)
    }

    pub fn list_assignees(
        &self,
        key: WorkflowRoleKey,
    ) -> Result<std::collections::BTreeSet<UserId>, DirectoryError> {
        self.read(|r| r.list_assignees(key))
    }

    pub fn assignments(&self, key: WorkflowRoleKey) -> Result<Vec<AssignmentRecord>, DirectoryError> {
        self.read(|r| r.assignments(key).to_vec())
    }

    /// Copy of the current registry, e.g. for persisting business settings.
    pub fn snapshot(&self) -> Result<WorkflowRoleRegistry, DirectoryError> {
        self.read(WorkflowRoleRegistry::clone)
    }

    #[cfg(test)]
    pub(crate) fn hold_write_lock(&self) -> parking_lot::RwLockWriteGuard<'_, WorkflowRoleRegistry> {
        self.inner.write()
    }
}

impl RoleDirectory for SharedRoleRegistry {
    fn is_assigned(&self, key: WorkflowRoleKey, user_id: UserId) -> Result<bool, DirectoryError> {
        self.read(|r| r.is_assigned(key, user_id))
    }

    fn roles_of(&self, user_id: UserId) -> Result<Vec<WorkflowRoleKey>, DirectoryError> {
        self.read(|r| r.roles_of(user_id))
    }
}
