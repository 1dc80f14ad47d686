use thiserror::Error;

use bazaar_core::{DocumentId, DomainError, UserId};

use crate::document::{DocumentStatus, Transition};

/// State-machine failures. All of them leave the document untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
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

    #[error("document {0} already exists")]
    AlreadyExists(DocumentId),

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
