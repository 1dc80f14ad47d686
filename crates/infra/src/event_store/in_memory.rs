use std::collections::BTreeMap;

use parking_lot::RwLock;

use bazaar_core::{DocumentId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only event store for tests and single-process use.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<BTreeMap<DocumentId, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let Some(head) = events.first() else {
            return Ok(vec![]);
        };
        let stream_id = head.stream_id;
        let stream_type = head.stream_type.clone();

        for (idx, e) in events.iter().enumerate() {
            if e.stream_id != stream_id {
                return Err(EventStoreError::InvalidAppend(format!(
                    "batch spans multiple streams (index {idx})"
                )));
            }
            if e.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "batch contains multiple stream types (index {idx})"
                )));
            }
        }

        let mut streams = self.streams.write();
        let stream = streams.entry(stream_id).or_default();
        let current = Self::current_version(stream);

        expected_version
            .check(current)
            .map_err(|err| EventStoreError::Concurrency(err.to_string()))?;

        if let Some(existing) = stream.first() {
            if existing.stream_type != stream_type {
                return Err(EventStoreError::StreamTypeMismatch(format!(
                    "stream type is '{}', attempted append with '{}'",
                    existing.stream_type, stream_type
                )));
            }
        }

        let mut next = current + 1;
        let mut committed = Vec::with_capacity(events.len());
        for e in events {
            let stored = StoredEvent {
                event_id: e.event_id,
                stream_id: e.stream_id,
                stream_type: e.stream_type,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            };
            next += 1;
            stream.push(stored.clone());
            committed.push(stored);
        }

        Ok(committed)
    }

    fn load_stream(&self, stream_id: DocumentId) -> Result<Vec<StoredEvent>, EventStoreError> {
        Ok(self.streams.read().get(&stream_id).cloned().unwrap_or_default())
    }

    fn stream_ids(&self) -> Result<Vec<DocumentId>, EventStoreError> {
        Ok(self.streams.read().keys().copied().collect())
    }
}
