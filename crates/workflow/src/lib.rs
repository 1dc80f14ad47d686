//! `bazaar-workflow`: dual-signature approval of financial audit documents.
//!
//! Cash counts, goods costings and goods receivings share one state machine:
//!
//! ```text
//! draft --submit--> first_signed --counter-sign--> second_signed --approve--> accepted
//!                                                               \--reject---> rejected
//! ```
//!
//! This crate is pure domain logic: [`AuditDocument`] decides and applies
//! transitions, the [`WorkflowRoleRegistry`] records who holds which duty.
//! Loading, locking, persistence and linked mutations live in `bazaar-infra`.

pub mod document;
pub mod error;
pub mod payload;
pub mod registry;
pub mod settings;
pub mod signature;

pub use document::{
    Audited, AuditDocument, CounterSign, CounterSigned, CreateDraft, DocumentStatus, DraftCreated,
    FinalizeAudit, Signatures, Submit, Submitted, Transition, WorkflowCommand, WorkflowEvent,
};
pub use error::WorkflowError;
pub use payload::{
    AdditionalCosts, CashCount, CostingBreakdown, DenominationCount, DocumentKind,
    DocumentPayload, GoodsCosting, GoodsReceiving, Payload, PriceRevision, ReceivingLine,
};
pub use registry::{
    AssignmentRecord, DirectoryError, RegistryError, RoleDirectory, WorkflowRoleKey,
    WorkflowRoleRegistry,
};
pub use settings::BusinessSettings;
pub use signature::{AuditDecision, AuditEntry, OwnerAudit, Signature, Signer};
