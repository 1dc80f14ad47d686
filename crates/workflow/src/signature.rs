//! Attestations recorded on documents.
//!
//! A signature is an identity + role + timestamp captured when a transition
//! executes. It is never edited; a new attestation is always a new record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_auth::{Role, User};
use bazaar_core::UserId;

use crate::document::DocumentStatus;
use crate::registry::WorkflowRoleKey;

/// The actor of a transition, as captured at the moment of the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    /// Workflow duty exercised; `None` when signing as an Owner/Admin stand-in.
    pub acting_as: Option<WorkflowRoleKey>,
}

impl Signer {
    pub fn new(user: &User, acting_as: Option<WorkflowRoleKey>) -> Self {
        Self {
            user_id: user.id,
            user_name: user.name.clone(),
            role: user.role,
            acting_as,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub user_id: UserId,
    pub user_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_as: Option<WorkflowRoleKey>,
    pub timestamp: DateTime<Utc>,
}

impl Signature {
    pub fn new(signer: &Signer, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: signer.user_id,
            user_name: signer.user_name.clone(),
            role: signer.role,
            acting_as: signer.acting_as,
            timestamp,
        }
    }
}

/// Final owner-audit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    Accepted,
    Rejected,
}

impl AuditDecision {
    pub fn status(self) -> DocumentStatus {
        match self {
            AuditDecision::Accepted => DocumentStatus::Accepted,
            AuditDecision::Rejected => DocumentStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerAudit {
    pub user_id: UserId,
    pub user_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: AuditDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One line of a document's append-only trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub status: DocumentStatus,
    pub actor_id: UserId,
    pub actor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
