//! Error taxonomy surfaced to callers of the approval engine.

use thiserror::Error;

use bazaar_auth::AuthzError;
use bazaar_core::{DocumentId, DomainError, UserId};
use bazaar_workflow::{
    DirectoryError, DocumentStatus, RegistryError, Transition, WorkflowError, WorkflowRoleKey,
};

use crate::event_store::EventStoreError;

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("access denied: {permission} (user: {user:?})")]
    AccessDenied {
        user: Option<UserId>,
        permission: String,
    },

    #[error("document {document_id}: cannot {attempted} while {from}")]
    InvalidTransition {
        document_id: DocumentId,
        from: DocumentStatus,
        attempted: Transition,
    },

    #[error("document {document_id}: user {actor} signed first and cannot {attempted} it")]
    SelfSigningViolation {
        document_id: DocumentId,
        actor: UserId,
        attempted: Transition,
    },

    #[error("document {document_id}: user {actor} does not hold {required} needed to {attempted}")]
    UnauthorizedRole {
        document_id: DocumentId,
        actor: UserId,
        required: WorkflowRoleKey,
        attempted: Transition,
    },

    #[error("document {document_id}: linked mutation failed, acceptance not recorded: {reason}")]
    LinkedMutationFailure {
        document_id: DocumentId,
        reason: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("concurrent update: {0}")]
    Concurrency(String),

    #[error("workflow role registry unavailable: {0}")]
    RegistryUnavailable(#[source] DirectoryError),

    #[error(transparent)]
    Assignment(#[from] RegistryError),

    #[error("event store failure: {0}")]
    Store(EventStoreError),

    /// Stored data that cannot be interpreted. Needs operator attention.
    #[error("corrupt document {document_id}: {reason}")]
    Corrupt {
        document_id: DocumentId,
        reason: String,
    },
}

impl ApprovalError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApprovalError::RegistryUnavailable(_) | ApprovalError::Concurrency(_)
        )
    }

    /// Conditions that indicate a defect or damaged data rather than a refused request.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, ApprovalError::Corrupt { .. } | ApprovalError::Store(_))
    }

    /// Map a state-machine refusal for `document_id`. A broken invariant means
    /// the stored document is damaged, not that the request was wrong.
    pub fn from_workflow(document_id: DocumentId, err: WorkflowError) -> Self {
        match err {
            WorkflowError::InvalidTransition {
                document_id,
                from,
                attempted,
            } => ApprovalError::InvalidTransition {
                document_id,
                from,
                attempted,
            },
            WorkflowError::SelfSigningViolation {
                document_id,
                actor,
                attempted,
            } => ApprovalError::SelfSigningViolation {
                document_id,
                actor,
                attempted,
            },
            WorkflowError::AlreadyExists(id) => {
                ApprovalError::Concurrency(format!("document {id} already exists"))
            }
            WorkflowError::NotFound(id) => ApprovalError::NotFound(id),
            WorkflowError::Domain(DomainError::Validation(msg) | DomainError::InvalidId(msg)) => {
                ApprovalError::Validation(msg)
            }
            WorkflowError::Domain(DomainError::Conflict(msg)) => ApprovalError::Concurrency(msg),
            WorkflowError::Domain(DomainError::InvariantViolation(reason)) => {
                ApprovalError::Corrupt { document_id, reason }
            }
        }
    }
}

impl From<EventStoreError> for ApprovalError {
    fn from(value: EventStoreError) -> Self {
        match value {
            EventStoreError::Concurrency(msg) => ApprovalError::Concurrency(msg),
            other => ApprovalError::Store(other),
        }
    }
}

impl From<AuthzError> for ApprovalError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::AccessDenied { user, permission } => {
                ApprovalError::AccessDenied { user, permission }
            }
        }
    }
}

impl From<DirectoryError> for ApprovalError {
    fn from(value: DirectoryError) -> Self {
        ApprovalError::RegistryUnavailable(value)
    }
}
