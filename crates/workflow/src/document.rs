//! The financial audit document aggregate and its state machine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Aggregate, AggregateRoot, DocumentId, DomainError, UserId};
use bazaar_events::Event;

use crate::error::WorkflowError;
use crate::payload::{DocumentKind, DocumentPayload};
use crate::signature::{AuditDecision, AuditEntry, OwnerAudit, Signature, Signer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    FirstSigned,
    SecondSigned,
    Accepted,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::FirstSigned => "first_signed",
            DocumentStatus::SecondSigned => "second_signed",
            DocumentStatus::Accepted => "accepted",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Accepted | DocumentStatus::Rejected)
    }

    /// Transitions valid from this status.
    pub fn next_transitions(self) -> &'static [Transition] {
        match self {
            DocumentStatus::Draft => &[Transition::Submit],
            DocumentStatus::FirstSigned => &[Transition::CounterSign],
            DocumentStatus::SecondSigned => &[Transition::Approve, Transition::Reject],
            DocumentStatus::Accepted | DocumentStatus::Rejected => &[],
        }
    }
}

impl core::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Submit,
    CounterSign,
    Approve,
    Reject,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::CounterSign => "counter_sign",
            Transition::Approve => "approve",
            Transition::Reject => "reject",
        }
    }

    /// The only status this transition may start from.
    pub fn from_status(self) -> DocumentStatus {
        match self {
            Transition::Submit => DocumentStatus::Draft,
            Transition::CounterSign => DocumentStatus::FirstSigned,
            Transition::Approve | Transition::Reject => DocumentStatus::SecondSigned,
        }
    }

    pub fn to_status(self) -> DocumentStatus {
        match self {
            Transition::Submit => DocumentStatus::FirstSigned,
            Transition::CounterSign => DocumentStatus::SecondSigned,
            Transition::Approve => DocumentStatus::Accepted,
            Transition::Reject => DocumentStatus::Rejected,
        }
    }
}

impl From<AuditDecision> for Transition {
    fn from(decision: AuditDecision) -> Self {
        match decision {
            AuditDecision::Accepted => Transition::Approve,
            AuditDecision::Rejected => Transition::Reject,
        }
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<Signature>,
}

/// Aggregate root: one cash count, goods costing or goods receiving.
///
/// Mutated only through [`Aggregate::handle`] + [`Aggregate::apply`]; the audit
/// log only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDocument<P> {
    id: DocumentId,
    date: Option<NaiveDate>,
    created_by: Option<Signer>,
    created_at: Option<DateTime<Utc>>,
    payload: Option<P>,
    status: DocumentStatus,
    signatures: Signatures,
    owner_audit: Option<OwnerAudit>,
    audit_log: Vec<AuditEntry>,
    version: u64,
    created: bool,
}

impl<P: DocumentPayload> AuditDocument<P> {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: DocumentId) -> Self {
        Self {
            id,
            date: None,
            created_by: None,
            created_at: None,
            payload: None,
            status: DocumentStatus::Draft,
            signatures: Signatures::default(),
            owner_audit: None,
            audit_log: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn created_by(&self) -> Option<&Signer> {
        self.created_by.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.payload.as_ref().map(|p| p.kind())
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn signatures(&self) -> &Signatures {
        &self.signatures
    }

    pub fn owner_audit(&self) -> Option<&OwnerAudit> {
        self.owner_audit.as_ref()
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit_log
    }

    pub fn first_signer(&self) -> Option<UserId> {
        self.signatures.first.as_ref().map(|s| s.user_id)
    }

    /// Whether the first-signer exclusion forbids `actor` from `transition`.
    ///
    /// Only counter-signing and approval are checked; rejecting is always open.
    pub fn blocks_self_signing(
        &self,
        actor: UserId,
        transition: Transition,
        enforce_unique_signers: bool,
    ) -> bool {
        enforce_unique_signers
            && matches!(transition, Transition::CounterSign | Transition::Approve)
            && self.first_signer() == Some(actor)
    }
}

impl<P> AggregateRoot for AuditDocument<P> {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateDraft. Not a status transition; the document starts as `draft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDraft<P> {
    pub document_id: DocumentId,
    pub date: NaiveDate,
    pub payload: P,
    pub author: Signer,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Submit (first signature).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submit {
    pub document_id: DocumentId,
    pub actor: Signer,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CounterSign (second signature).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSign {
    pub document_id: DocumentId,
    pub actor: Signer,
    pub enforce_unique_signers: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FinalizeAudit (owner audit, approve or reject).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeAudit {
    pub document_id: DocumentId,
    pub actor: Signer,
    pub decision: AuditDecision,
    pub note: Option<String>,
    pub enforce_unique_signers: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowCommand<P> {
    CreateDraft(CreateDraft<P>),
    Submit(Submit),
    CounterSign(CounterSign),
    FinalizeAudit(FinalizeAudit),
}

/// Event: DraftCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftCreated<P> {
    pub document_id: DocumentId,
    pub date: NaiveDate,
    pub payload: P,
    pub created_by: Signer,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitted {
    pub document_id: DocumentId,
    pub signature: Signature,
}

/// Event: CounterSigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSigned {
    pub document_id: DocumentId,
    pub signature: Signature,
}

/// Event: Audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audited {
    pub document_id: DocumentId,
    pub audit: OwnerAudit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent<P> {
    DraftCreated(DraftCreated<P>),
    Submitted(Submitted),
    CounterSigned(CounterSigned),
    Audited(Audited),
}

impl<P: DocumentPayload> Event for WorkflowEvent<P> {
    fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::DraftCreated(_) => "workflow.document.draft_created",
            WorkflowEvent::Submitted(_) => "workflow.document.submitted",
            WorkflowEvent::CounterSigned(_) => "workflow.document.counter_signed",
            WorkflowEvent::Audited(_) => "workflow.document.audited",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WorkflowEvent::DraftCreated(e) => e.occurred_at,
            WorkflowEvent::Submitted(e) => e.signature.timestamp,
            WorkflowEvent::CounterSigned(e) => e.signature.timestamp,
            WorkflowEvent::Audited(e) => e.audit.timestamp,
        }
    }
}

impl<P: DocumentPayload> Aggregate for AuditDocument<P> {
    type Command = WorkflowCommand<P>;
    type Event = WorkflowEvent<P>;
    type Error = WorkflowError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            WorkflowEvent::DraftCreated(e) => {
                self.id = e.document_id;
                self.date = Some(e.date);
                self.created_by = Some(e.created_by.clone());
                self.created_at = Some(e.occurred_at);
                self.payload = Some(e.payload.clone());
                self.status = DocumentStatus::Draft;
                self.created = true;
            }
            WorkflowEvent::Submitted(e) => {
                self.status = Transition::Submit.to_status();
                self.signatures.first = Some(e.signature.clone());
                self.audit_log.push(entry_for(&e.signature, self.status, None));
            }
            WorkflowEvent::CounterSigned(e) => {
                self.status = Transition::CounterSign.to_status();
                self.signatures.second = Some(e.signature.clone());
                self.audit_log.push(entry_for(&e.signature, self.status, None));
            }
            WorkflowEvent::Audited(e) => {
                self.status = e.audit.status.status();
                self.owner_audit = Some(e.audit.clone());
                self.audit_log.push(AuditEntry {
                    timestamp: e.audit.timestamp,
                    status: self.status,
                    actor_id: e.audit.user_id,
                    actor_name: e.audit.user_name.clone(),
                    note: e.audit.note.clone(),
                });
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            WorkflowCommand::CreateDraft(cmd) => self.handle_create(cmd),
            WorkflowCommand::Submit(cmd) => self.handle_submit(cmd),
            WorkflowCommand::CounterSign(cmd) => self.handle_counter_sign(cmd),
            WorkflowCommand::FinalizeAudit(cmd) => self.handle_finalize(cmd),
        }
    }
}

fn entry_for(signature: &Signature, status: DocumentStatus, note: Option<String>) -> AuditEntry {
    AuditEntry {
        timestamp: signature.timestamp,
        status,
        actor_id: signature.user_id,
        actor_name: signature.user_name.clone(),
        note,
    }
}

impl<P: DocumentPayload> AuditDocument<P> {
    fn ensure_document(&self, document_id: DocumentId) -> Result<(), WorkflowError> {
        if !self.created {
            return Err(WorkflowError::NotFound(document_id));
        }
        if self.id != document_id {
            return Err(DomainError::invariant("document_id mismatch").into());
        }
        Ok(())
    }

    fn ensure_transition(&self, attempted: Transition) -> Result<(), WorkflowError> {
        if self.status != attempted.from_status() {
            return Err(WorkflowError::InvalidTransition {
                document_id: self.id,
                from: self.status,
                attempted,
            });
        }
        Ok(())
    }

    fn ensure_not_self_signed(
        &self,
        actor: UserId,
        attempted: Transition,
        enforce_unique_signers: bool,
    ) -> Result<(), WorkflowError> {
        if self.blocks_self_signing(actor, attempted, enforce_unique_signers) {
            return Err(WorkflowError::SelfSigningViolation {
                document_id: self.id,
                actor,
                attempted,
            });
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateDraft<P>) -> Result<Vec<WorkflowEvent<P>>, WorkflowError> {
        if self.created {
            return Err(WorkflowError::AlreadyExists(self.id));
        }
        cmd.payload.validate()?;

        Ok(vec![WorkflowEvent::DraftCreated(DraftCreated {
            document_id: cmd.document_id,
            date: cmd.date,
            payload: cmd.payload.clone(),
            created_by: cmd.author.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &Submit) -> Result<Vec<WorkflowEvent<P>>, WorkflowError> {
        self.ensure_document(cmd.document_id)?;
        self.ensure_transition(Transition::Submit)?;

        Ok(vec![WorkflowEvent::Submitted(Submitted {
            document_id: cmd.document_id,
            signature: Signature::new(&cmd.actor, cmd.occurred_at),
        })])
    }

    fn handle_counter_sign(
        &self,
        cmd: &CounterSign,
    ) -> Result<Vec<WorkflowEvent<P>>, WorkflowError> {
        self.ensure_document(cmd.document_id)?;
        self.ensure_transition(Transition::CounterSign)?;
        self.ensure_not_self_signed(
            cmd.actor.user_id,
            Transition::CounterSign,
            cmd.enforce_unique_signers,
        )?;

        Ok(vec![WorkflowEvent::CounterSigned(CounterSigned {
            document_id: cmd.document_id,
            signature: Signature::new(&cmd.actor, cmd.occurred_at),
        })])
    }

    fn handle_finalize(&self, cmd: &FinalizeAudit) -> Result<Vec<WorkflowEvent<P>>, WorkflowError> {
        let attempted = Transition::from(cmd.decision);
        self.ensure_document(cmd.document_id)?;
        self.ensure_transition(attempted)?;
        self.ensure_not_self_signed(cmd.actor.user_id, attempted, cmd.enforce_unique_signers)?;

        Ok(vec![WorkflowEvent::Audited(Audited {
            document_id: cmd.document_id,
            audit: OwnerAudit {
                user_id: cmd.actor.user_id,
                user_name: cmd.actor.user_name.clone(),
                timestamp: cmd.occurred_at,
                status: cmd.decision,
                note: cmd.note.clone(),
            },
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{CashCount, DenominationCount, Payload};
    use crate::registry::WorkflowRoleKey;
    use bazaar_auth::{Role, User};
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn cash_count() -> Payload {
        Payload::from(CashCount {
            register: "front".into(),
            expected_balance: Decimal::from(100),
            denominations: vec![DenominationCount { value: Decimal::from(50), count: 2 }],
        })
    }

    fn signer(name: &str, key: WorkflowRoleKey) -> Signer {
        Signer::new(&User::new(name, Role::Staff), Some(key))
    }

    fn run(doc: &mut AuditDocument<Payload>, cmd: WorkflowCommand<Payload>) -> Result<(), WorkflowError> {
        let events = doc.handle(&cmd)?;
        for event in &events {
            doc.apply(event);
        }
        Ok(())
    }

    fn drafted(author: &Signer) -> AuditDocument<Payload> {
        let id = DocumentId::new();
        let mut doc = AuditDocument::empty(id);
        run(
            &mut doc,
            WorkflowCommand::CreateDraft(CreateDraft {
                document_id: id,
                date: test_date(),
                payload: cash_count(),
                author: author.clone(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        doc
    }

    fn submit(actor: &Signer, id: DocumentId) -> WorkflowCommand<Payload> {
        WorkflowCommand::Submit(Submit {
            document_id: id,
            actor: actor.clone(),
            occurred_at: test_time(),
        })
    }

    fn counter_sign(actor: &Signer, id: DocumentId) -> WorkflowCommand<Payload> {
        WorkflowCommand::CounterSign(CounterSign {
            document_id: id,
            actor: actor.clone(),
            enforce_unique_signers: true,
            occurred_at: test_time(),
        })
    }

    fn finalize(actor: &Signer, id: DocumentId, decision: AuditDecision) -> WorkflowCommand<Payload> {
        WorkflowCommand::FinalizeAudit(FinalizeAudit {
            document_id: id,
            actor: actor.clone(),
            decision,
            note: Some("checked".into()),
            enforce_unique_signers: true,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn draft_creation_leaves_the_log_empty() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let doc = drafted(&author);
        assert!(doc.is_created());
        assert_eq!(doc.status(), DocumentStatus::Draft);
        assert!(doc.audit_log().is_empty());
        assert_eq!(doc.kind(), Some(DocumentKind::CashCount));
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn submit_counter_sign_approve_reaches_accepted() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let verifier = signer("Ben", WorkflowRoleKey::CashVerifier);
        let approver = signer("Cy", WorkflowRoleKey::CashApprover);
        let mut doc = drafted(&author);
        let id = doc.id_typed();

        run(&mut doc, submit(&author, id)).unwrap();
        assert_eq!(doc.status(), DocumentStatus::FirstSigned);
        assert_eq!(doc.first_signer(), Some(author.user_id));

        run(&mut doc, counter_sign(&verifier, id)).unwrap();
        assert_eq!(doc.status(), DocumentStatus::SecondSigned);
        assert_eq!(
            doc.signatures().second.as_ref().map(|s| s.user_id),
            Some(verifier.user_id)
        );

        run(&mut doc, finalize(&approver, id, AuditDecision::Accepted)).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Accepted);
        assert!(doc.status().is_terminal());

        let statuses: Vec<DocumentStatus> = doc.audit_log().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                DocumentStatus::FirstSigned,
                DocumentStatus::SecondSigned,
                DocumentStatus::Accepted
            ]
        );
        assert_eq!(doc.audit_log()[2].note.as_deref(), Some("checked"));
        assert_eq!(doc.owner_audit().map(|a| a.user_id), Some(approver.user_id));
    }

    #[test]
    fn reject_reaches_rejected_and_nothing_follows() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let verifier = signer("Ben", WorkflowRoleKey::CashVerifier);
        let approver = signer("Cy", WorkflowRoleKey::CashApprover);
        let mut doc = drafted(&author);
        let id = doc.id_typed();

        run(&mut doc, submit(&author, id)).unwrap();
        run(&mut doc, counter_sign(&verifier, id)).unwrap();
        run(&mut doc, finalize(&approver, id, AuditDecision::Rejected)).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Rejected);

        let err = run(&mut doc, finalize(&approver, id, AuditDecision::Accepted)).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition { from: DocumentStatus::Rejected, .. }
        ));
    }

    #[test]
    fn submitting_twice_is_an_invalid_transition() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let mut doc = drafted(&author);
        let id = doc.id_typed();
        run(&mut doc, submit(&author, id)).unwrap();
        let log_len = doc.audit_log().len();

        let err = run(&mut doc, submit(&author, id)).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                document_id: id,
                from: DocumentStatus::FirstSigned,
                attempted: Transition::Submit,
            }
        );
        assert_eq!(doc.audit_log().len(), log_len);
    }

    #[test]
    fn counter_signing_a_draft_is_rejected() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let verifier = signer("Ben", WorkflowRoleKey::CashVerifier);
        let doc = drafted(&author);
        let err = doc.handle(&counter_sign(&verifier, doc.id_typed())).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition { from: DocumentStatus::Draft, attempted: Transition::CounterSign, .. }
        ));
    }

    #[test]
    fn first_signer_cannot_counter_sign_or_approve() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let verifier = signer("Ben", WorkflowRoleKey::CashVerifier);
        let mut doc = drafted(&author);
        let id = doc.id_typed();
        run(&mut doc, submit(&author, id)).unwrap();

        let before = doc.clone();
        let err = run(&mut doc, counter_sign(&author, id)).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::SelfSigningViolation {
                document_id: id,
                actor: author.user_id,
                attempted: Transition::CounterSign,
            }
        );
        assert_eq!(doc, before);

        run(&mut doc, counter_sign(&verifier, id)).unwrap();
        let err = run(&mut doc, finalize(&author, id, AuditDecision::Accepted)).unwrap_err();
        assert!(matches!(err, WorkflowError::SelfSigningViolation { attempted: Transition::Approve, .. }));

        // Rejecting one's own document is still allowed.
        run(&mut doc, finalize(&author, id, AuditDecision::Rejected)).unwrap();
        assert_eq!(doc.status(), DocumentStatus::Rejected);
    }

    #[test]
    fn self_signing_allowed_when_not_enforced() {
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        let mut doc = drafted(&author);
        let id = doc.id_typed();
        run(&mut doc, submit(&author, id)).unwrap();
        run(
            &mut doc,
            WorkflowCommand::CounterSign(CounterSign {
                document_id: id,
                actor: author.clone(),
                enforce_unique_signers: false,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        assert_eq!(doc.status(), DocumentStatus::SecondSigned);
    }

    #[test]
    fn transitions_on_missing_document_are_not_found() {
        let id = DocumentId::new();
        let doc: AuditDocument<Payload> = AuditDocument::empty(id);
        let author = signer("Ann", WorkflowRoleKey::CashCounter);
        assert_eq!(doc.handle(&submit(&author, id)).unwrap_err(), WorkflowError::NotFound(id));
    }

    #[test]
    fn invalid_payload_is_refused_at_draft_creation() {
        let id = DocumentId::new();
        let doc: AuditDocument<Payload> = AuditDocument::empty(id);
        let bad = Payload::from(CashCount {
            register: " ".into(),
            expected_balance: Decimal::ZERO,
            denominations: vec![],
        });
        let err = doc
            .handle(&WorkflowCommand::CreateDraft(CreateDraft {
                document_id: id,
                date: test_date(),
                payload: bad,
                author: signer("Ann", WorkflowRoleKey::CashCounter),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn transition_table_agrees_with_statuses() {
        let statuses = [
            DocumentStatus::Draft,
            DocumentStatus::FirstSigned,
            DocumentStatus::SecondSigned,
            DocumentStatus::Accepted,
            DocumentStatus::Rejected,
        ];
        for status in statuses {
            for t in status.next_transitions() {
                assert_eq!(t.from_status(), status);
                assert_ne!(t.to_status(), status);
            }
            assert_eq!(status.is_terminal(), status.next_transitions().is_empty());
        }
        assert_eq!(Transition::from(AuditDecision::Rejected).to_status(), DocumentStatus::Rejected);
    }

    #[test]
    fn status_serialises_in_snake_case() {
        let json = serde_json::to_string(&DocumentStatus::SecondSigned).unwrap();
        assert_eq!(json, "\"second_signed\"");
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Submit,
        CounterSign,
        Approve,
        Reject,
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Submit),
            Just(Step::CounterSign),
            Just(Step::Approve),
            Just(Step::Reject),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        /// Whatever sequence is attempted, the log grows by exactly one entry per
        /// accepted transition and terminal states are only accepted/rejected.
        #[test]
        fn log_tracks_successful_transitions(steps in prop::collection::vec(step_strategy(), 0..12)) {
            let author = signer("Ann", WorkflowRoleKey::CashCounter);
            let verifier = signer("Ben", WorkflowRoleKey::CashVerifier);
            let approver = signer("Cy", WorkflowRoleKey::CashApprover);
            let mut doc = drafted(&author);
            let id = doc.id_typed();
            let mut committed = 0usize;

            for step in steps {
                let cmd = match step {
                    Step::Submit => submit(&author, id),
                    Step::CounterSign => counter_sign(&verifier, id),
                    Step::Approve => finalize(&approver, id, AuditDecision::Accepted),
                    Step::Reject => finalize(&approver, id, AuditDecision::Rejected),
                };
                let before = doc.audit_log().to_vec();
                match run(&mut doc, cmd) {
                    Ok(()) => committed += 1,
                    Err(_) => prop_assert_eq!(doc.audit_log(), before.as_slice()),
                }
                prop_assert_eq!(&doc.audit_log()[..before.len()], before.as_slice());
            }

            prop_assert_eq!(doc.audit_log().len(), committed);
            prop_assert_eq!(doc.version(), committed as u64 + 1);
            if doc.status().is_terminal() {
                prop_assert!(matches!(doc.status(), DocumentStatus::Accepted | DocumentStatus::Rejected));
                prop_assert_eq!(committed, 3);
            }
        }
    }
}
