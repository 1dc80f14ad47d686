use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use bazaar_core::{DocumentId, ExpectedVersion};

/// An event ready to be appended (not yet assigned a sequence number).
///
/// Build it with [`UncommittedEvent::from_typed`], which serialises the domain
/// event and captures its type, schema version and business time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub stream_id: DocumentId,
    pub stream_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// A persisted event.
///
/// Sequence numbers start at 1, are per stream, have no gaps and never change.
/// The last sequence number of a stream is the document's version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub stream_id: DocumentId,
    pub stream_type: String,

    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    /// Envelope published to collaborators once the append has committed.
    pub fn to_envelope(&self) -> bazaar_events::EventEnvelope<JsonValue> {
        bazaar_events::EventEnvelope::new(
            self.event_id,
            *self.stream_id.as_uuid(),
            self.stream_type.clone(),
            self.sequence_number,
            self.event_type.clone(),
            self.occurred_at,
            self.payload.clone(),
        )
    }
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("stream type mismatch: {0}")]
    StreamTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event store unavailable: {0}")]
    Unavailable(String),
}

/// Append-only store of document streams.
///
/// `append` must:
/// - reject batches that span more than one stream
/// - check `expected_version` against the current stream version
/// - assign sequence numbers `current + 1 ..` and persist all-or-nothing
///
/// `load_stream` returns events in sequence order, or an empty vector for an
/// unknown stream.
pub trait EventStore: Send + Sync {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    fn load_stream(&self, stream_id: DocumentId) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Every stream id, in ascending order.
    fn stream_ids(&self) -> Result<Vec<DocumentId>, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version)
    }

    fn load_stream(&self, stream_id: DocumentId) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_stream(stream_id)
    }

    fn stream_ids(&self) -> Result<Vec<DocumentId>, EventStoreError> {
        (**self).stream_ids()
    }
}

impl UncommittedEvent {
    pub fn from_typed<E>(
        stream_id: DocumentId,
        stream_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventStoreError>
    where
        E: bazaar_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event).map_err(|e| {
            EventStoreError::InvalidAppend(format!("payload serialization failed: {e}"))
        })?;

        Ok(Self {
            event_id,
            stream_id,
            stream_type: stream_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}
