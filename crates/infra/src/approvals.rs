//! Approval engine: the entry point the application layer calls.
//!
//! Every transition runs the same pipeline:
//!
//! ```text
//! lock document -> load stream -> rehydrate -> authorize actor
//!   -> handle (pure) -> linked mutation (acceptance only)
//!   -> append (ExpectedVersion::Exact) -> publish -> unlock
//! ```
//!
//! If the append fails after a linked mutation was applied, the mutation is
//! restored before the error is returned, so a document is never left
//! un-accepted with its price change in place (or accepted without it).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};
use uuid::Uuid;

use bazaar_auth::{AccessPolicy, Permission, User, authorize, has_access};
use bazaar_core::{Aggregate, DocumentId, ExpectedVersion};
use bazaar_events::{EventBus, EventEnvelope};
use bazaar_workflow::{
    AuditDecision, AuditDocument, CounterSign, CreateDraft, DocumentKind, DocumentPayload,
    FinalizeAudit, Payload, PriceRevision, RoleDirectory, Signer, Submit, Transition,
    WorkflowCommand, WorkflowError, WorkflowEvent,
};

use crate::config::EngineConfig;
use crate::error::ApprovalError;
use crate::event_store::{EventStore, StoredEvent, UncommittedEvent};
use crate::products::PriceSink;

/// The document type the engine stores.
pub type Document = AuditDocument<Payload>;

type DocumentLock = Arc<Mutex<()>>;

pub struct ApprovalEngine<S, B> {
    store: S,
    bus: B,
    directory: Arc<dyn RoleDirectory>,
    prices: Arc<dyn PriceSink>,
    policy: AccessPolicy,
    config: EngineConfig,
    locks: Mutex<HashMap<DocumentId, DocumentLock>>,
}

impl<S, B> ApprovalEngine<S, B> {
    pub fn new(
        store: S,
        bus: B,
        directory: Arc<dyn RoleDirectory>,
        prices: Arc<dyn PriceSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            bus,
            directory,
            prices,
            policy: AccessPolicy::default(),
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Resolver check for UI gating, with the engine's policy and safe-mode flag.
    pub fn has_access(&self, actor: Option<&User>, permission: Permission) -> bool {
        has_access(actor, permission, &self.policy, self.config.safe_mode)
    }

    fn document_lock(&self, document_id: DocumentId) -> DocumentLock {
        self.locks.lock().entry(document_id).or_default().clone()
    }

    /// Drop the map entry once no other caller holds or waits on it.
    fn release_lock(&self, document_id: DocumentId, lock: DocumentLock) {
        let mut locks = self.locks.lock();
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&document_id);
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.lock().len()
    }
}

impl<S, B> ApprovalEngine<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Store a new `draft` document authored by `actor`. Adds no audit entry.
    pub fn create_draft(
        &self,
        date: NaiveDate,
        payload: impl Into<Payload>,
        actor: &User,
    ) -> Result<Document, ApprovalError> {
        self.open(DocumentId::new(), date, payload.into(), actor, false)
    }

    /// Create and submit in one step: the document starts life as `first_signed`.
    pub fn submit_document(
        &self,
        date: NaiveDate,
        payload: impl Into<Payload>,
        actor: &User,
    ) -> Result<Document, ApprovalError> {
        self.open(DocumentId::new(), date, payload.into(), actor, true)
    }

    pub fn submit_draft(
        &self,
        document_id: DocumentId,
        actor: &User,
    ) -> Result<Document, ApprovalError> {
        self.execute(document_id, actor, Transition::Submit, None)
    }

    pub fn counter_sign(
        &self,
        document_id: DocumentId,
        actor: &User,
    ) -> Result<Document, ApprovalError> {
        self.execute(document_id, actor, Transition::CounterSign, None)
    }

    pub fn finalize_audit(
        &self,
        document_id: DocumentId,
        actor: &User,
        decision: AuditDecision,
        note: Option<String>,
    ) -> Result<Document, ApprovalError> {
        self.execute(document_id, actor, Transition::from(decision), note)
    }

    pub fn get_document(&self, document_id: DocumentId) -> Result<Document, ApprovalError> {
        let (document, _) = self.load(document_id)?;
        if !document.is_created() {
            return Err(ApprovalError::NotFound(document_id));
        }
        Ok(document)
    }

    /// All documents, oldest first.
    pub fn list_documents(&self) -> Result<Vec<Document>, ApprovalError> {
        self.store
            .stream_ids()?
            .into_iter()
            .map(|id| self.get_document(id))
            .collect()
    }

    /// Documents whose next step `actor` may perform right now.
    ///
    /// Documents the first-signer exclusion would block for `actor` are left out.
    pub fn list_pending_for(&self, actor: &User) -> Result<Vec<Document>, ApprovalError> {
        let held = self.directory.roles_of(actor.id)?;
        let enforce = self.config.settings.enforce_unique_signers;

        let pending = self
            .list_documents()?
            .into_iter()
            .filter(|doc| {
                let Some(kind) = doc.kind() else {
                    return false;
                };
                doc.status().next_transitions().iter().any(|&transition| {
                    let role_ok = held.contains(&kind.required_role(transition))
                        || (actor.role.is_workflow_admin()
                            && DocumentKind::admin_may_stand_in(transition));
                    let access_ok = !self.config.enforce_access_policy
                        || self.has_access(Some(actor), kind.permission_for(transition));
                    role_ok
                        && access_ok
                        && !doc.blocks_self_signing(actor.id, transition, enforce)
                })
            })
            .collect();
        Ok(pending)
    }

    fn open(
        &self,
        document_id: DocumentId,
        date: NaiveDate,
        payload: Payload,
        actor: &User,
        submit: bool,
    ) -> Result<Document, ApprovalError> {
        let kind = payload.kind();
        let author = self.authorize_transition(document_id, kind, Transition::Submit, actor)?;
        let occurred_at = Utc::now();

        let mut commands = vec![WorkflowCommand::CreateDraft(CreateDraft {
            document_id,
            date,
            payload,
            author: author.clone(),
            occurred_at,
        })];
        if submit {
            commands.push(WorkflowCommand::Submit(Submit {
                document_id,
                actor: author,
                occurred_at,
            }));
        }

        let (document, events) = decide(Document::empty(document_id), &commands)
            .map_err(|e| refused(document_id, actor, e))?;
        let committed = self.persist(document_id, kind, &events, ExpectedVersion::Exact(0))?;
        self.publish(&committed);

        info!(
            %document_id,
            kind = %kind,
            status = %document.status(),
            actor = %actor.id,
            "document created"
        );
        Ok(document)
    }

    fn execute(
        &self,
        document_id: DocumentId,
        actor: &User,
        transition: Transition,
        note: Option<String>,
    ) -> Result<Document, ApprovalError> {
        let lock = self.document_lock(document_id);
        let outcome = match lock.try_lock_for(self.config.registry_timeout()) {
            Some(_guard) => self.execute_locked(document_id, actor, transition, note),
            None => {
                warn!(%document_id, %transition, "document busy");
                Err(ApprovalError::Concurrency(format!(
                    "document {document_id} is being updated"
                )))
            }
        };
        self.release_lock(document_id, lock);
        outcome
    }

    fn execute_locked(
        &self,
        document_id: DocumentId,
        actor: &User,
        transition: Transition,
        note: Option<String>,
    ) -> Result<Document, ApprovalError> {
        let (current, version) = self.load(document_id)?;
        if !current.is_created() {
            return Err(ApprovalError::NotFound(document_id));
        }
        let kind = current.kind().ok_or_else(|| corrupt(document_id, "created without payload"))?;
        let from = current.status();

        let signer = self.authorize_transition(document_id, kind, transition, actor)?;
        let enforce_unique_signers = self.config.settings.enforce_unique_signers;
        let occurred_at = Utc::now();
        let command = match transition {
            Transition::Submit => WorkflowCommand::Submit(Submit {
                document_id,
                actor: signer,
                occurred_at,
            }),
            Transition::CounterSign => WorkflowCommand::CounterSign(CounterSign {
                document_id,
                actor: signer,
                enforce_unique_signers,
                occurred_at,
            }),
            Transition::Approve | Transition::Reject => {
                WorkflowCommand::FinalizeAudit(FinalizeAudit {
                    document_id,
                    actor: signer,
                    decision: if transition == Transition::Approve {
                        AuditDecision::Accepted
                    } else {
                        AuditDecision::Rejected
                    },
                    note,
                    enforce_unique_signers,
                    occurred_at,
                })
            }
        };

        let (next, events) = decide(current, &[command]).map_err(|e| refused(document_id, actor, e))?;

        let replaced = if transition == Transition::Approve {
            self.apply_linked_mutation(document_id, &next)?
        } else {
            None
        };

        let committed =
            match self.persist(document_id, kind, &events, ExpectedVersion::Exact(version)) {
                Ok(committed) => committed,
                Err(err) => return Err(self.compensate(document_id, replaced, err)),
            };
        self.publish(&committed);

        info!(
            %document_id,
            kind = %kind,
            from = %from,
            to = %next.status(),
            actor = %actor.id,
            "document transition committed"
        );
        Ok(next)
    }

    fn authorize_transition(
        &self,
        document_id: DocumentId,
        kind: DocumentKind,
        transition: Transition,
        actor: &User,
    ) -> Result<Signer, ApprovalError> {
        if self.config.enforce_access_policy {
            authorize(
                Some(actor),
                kind.permission_for(transition),
                &self.policy,
                self.config.safe_mode,
            )?;
        }

        let required = kind.required_role(transition);
        if self.directory.is_assigned(required, actor.id)? {
            return Ok(Signer::new(actor, Some(required)));
        }
        if actor.role.is_workflow_admin() && DocumentKind::admin_may_stand_in(transition) {
            return Ok(Signer::new(actor, None));
        }

        warn!(
            %document_id,
            actor = %actor.id,
            role = %actor.role,
            %required,
            %transition,
            "actor lacks workflow role"
        );
        Err(ApprovalError::UnauthorizedRole {
            document_id,
            actor: actor.id,
            required,
            attempted: transition,
        })
    }

    /// Apply the acceptance side effect, returning the prices it replaced.
    fn apply_linked_mutation(
        &self,
        document_id: DocumentId,
        accepted: &Document,
    ) -> Result<Option<PriceRevision>, ApprovalError> {
        let effect = match accepted.payload() {
            Some(payload) => payload.acceptance_effect(),
            None => Ok(None),
        };
        let revision = match effect {
            Ok(Some(revision)) => revision,
            Ok(None) => return Ok(None),
            Err(err) => {
                error!(%document_id, error = %err, "price revision could not be computed");
                return Err(ApprovalError::LinkedMutationFailure {
                    document_id,
                    reason: err.to_string(),
                });
            }
        };

        match self.prices.apply(&revision) {
            Ok(previous) => Ok(Some(previous)),
            Err(err) => {
                error!(%document_id, product_id = %revision.product_id, error = %err, "linked price update failed");
                Err(ApprovalError::LinkedMutationFailure {
                    document_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    fn compensate(
        &self,
        document_id: DocumentId,
        replaced: Option<PriceRevision>,
        cause: ApprovalError,
    ) -> ApprovalError {
        let Some(previous) = replaced else {
            return cause;
        };

        match self.prices.restore(&previous) {
            Ok(()) => {
                error!(%document_id, error = %cause, "acceptance not committed; product prices restored");
                cause
            }
            Err(restore_err) => {
                error!(
                    %document_id,
                    error = %cause,
                    restore_error = %restore_err,
                    "acceptance not committed and product prices could not be restored"
                );
                ApprovalError::LinkedMutationFailure {
                    document_id,
                    reason: format!("commit failed ({cause}); restore failed ({restore_err})"),
                }
            }
        }
    }

    fn load(&self, document_id: DocumentId) -> Result<(Document, u64), ApprovalError> {
        let history = self.store.load_stream(document_id)?;
        validate_loaded_stream(document_id, &history)?;

        let mut document = Document::empty(document_id);
        for stored in &history {
            let event: WorkflowEvent<Payload> = serde_json::from_value(stored.payload.clone())
                .map_err(|e| corrupt(document_id, format!("undecodable event: {e}")))?;
            document.apply(&event);
        }
        Ok((document, stream_version(&history)))
    }

    fn persist(
        &self,
        document_id: DocumentId,
        kind: DocumentKind,
        events: &[WorkflowEvent<Payload>],
        expected: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, ApprovalError> {
        let uncommitted = events
            .iter()
            .map(|ev| UncommittedEvent::from_typed(document_id, kind.as_str(), Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.store.append(uncommitted, expected)?)
    }

    /// Publication happens after commit; the stream stays the record of truth.
    fn publish(&self, committed: &[StoredEvent]) {
        for stored in committed {
            if let Err(err) = self.bus.publish(stored.to_envelope()) {
                warn!(
                    document_id = %stored.stream_id,
                    sequence = stored.sequence_number,
                    error = ?err,
                    "event publication failed"
                );
            }
        }
    }
}

/// Run `commands` against `document` without persisting anything.
fn decide(
    mut document: Document,
    commands: &[WorkflowCommand<Payload>],
) -> Result<(Document, Vec<WorkflowEvent<Payload>>), WorkflowError> {
    let mut decided = Vec::new();
    for command in commands {
        let events = document.handle(command)?;
        for event in &events {
            document.apply(event);
        }
        decided.extend(events);
    }
    Ok((document, decided))
}

fn refused(document_id: DocumentId, actor: &User, err: WorkflowError) -> ApprovalError {
    let mapped = ApprovalError::from_workflow(document_id, err);
    if mapped.is_unrecoverable() {
        error!(%document_id, actor = %actor.id, error = %mapped, "document state is inconsistent");
    } else {
        warn!(%document_id, actor = %actor.id, error = %mapped, "transition refused");
    }
    mapped
}

fn corrupt(document_id: DocumentId, reason: impl Into<String>) -> ApprovalError {
    let reason = reason.into();
    error!(%document_id, %reason, "corrupt document stream");
    ApprovalError::Corrupt { document_id, reason }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    document_id: DocumentId,
    stream: &[StoredEvent],
) -> Result<(), ApprovalError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.stream_id != document_id {
            return Err(corrupt(document_id, format!("foreign event at index {idx}")));
        }
        if e.sequence_number != last + 1 {
            return Err(corrupt(
                document_id,
                format!("sequence gap (last={last}, found={})", e.sequence_number),
            ));
        }
        last = e.sequence_number;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bazaar_auth::Role;
    use bazaar_events::InMemoryEventBus;
    use bazaar_workflow::{CashCount, WorkflowRoleRegistry};
    use rust_decimal::Decimal;

    use super::*;
    use crate::event_store::InMemoryEventStore;
    use crate::products::InMemoryProductCatalog;

    fn engine() -> ApprovalEngine<InMemoryEventStore, InMemoryEventBus<EventEnvelope<JsonValue>>> {
        ApprovalEngine::new(
            InMemoryEventStore::new(),
            InMemoryEventBus::new(),
            Arc::new(WorkflowRoleRegistry::new()),
            Arc::new(InMemoryProductCatalog::new()),
            EngineConfig::default(),
        )
    }

    fn count() -> CashCount {
        CashCount {
            register: "front".into(),
            expected_balance: Decimal::from(20),
            denominations: vec![],
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[test]
    fn owner_may_author_without_an_assignment() {
        let engine = engine();
        let owner = User::new("Olu", Role::Owner);
        let doc = engine.create_draft(today(), count(), &owner).unwrap();
        assert_eq!(doc.created_by().and_then(|s| s.acting_as), None);

        let stored = engine.get_document(doc.id_typed()).unwrap();
        assert_eq!(stored, doc);
    }

    #[test]
    fn unknown_document_is_not_found() {
        let engine = engine();
        let owner = User::new("Olu", Role::Owner);
        let missing = DocumentId::new();
        assert!(matches!(
            engine.submit_draft(missing, &owner),
            Err(ApprovalError::NotFound(id)) if id == missing
        ));
        assert!(matches!(engine.get_document(missing), Err(ApprovalError::NotFound(_))));
    }

    #[test]
    fn lock_entries_do_not_outlive_their_transition() {
        let engine = engine();
        let owner = User::new("Olu", Role::Owner);
        for _ in 0..100 {
            assert!(engine.submit_draft(DocumentId::new(), &owner).is_err());
        }
        assert_eq!(engine.tracked_locks(), 0);

        let doc = engine.create_draft(today(), count(), &owner).unwrap();
        engine.submit_draft(doc.id_typed(), &owner).unwrap();
        assert_eq!(engine.tracked_locks(), 0);
    }

    #[test]
    fn loaded_streams_must_be_gap_free() {
        let id = DocumentId::new();
        let event = StoredEvent {
            event_id: Uuid::now_v7(),
            stream_id: id,
            stream_type: "cash_count".into(),
            sequence_number: 2,
            event_type: "workflow.document.submitted".into(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: JsonValue::Null,
        };
        assert!(matches!(
            validate_loaded_stream(id, &[event]),
            Err(ApprovalError::Corrupt { .. })
        ));
    }
}
