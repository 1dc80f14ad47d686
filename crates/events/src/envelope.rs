use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A committed document event as seen by collaborators on the bus.
///
/// `sequence_number` is the event's position in its document stream (from 1),
/// so a consumer can detect duplicates and gaps per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    stream_id: Uuid,
    /// Document kind the stream belongs to (`cash_count`, `goods_costing`, ..).
    stream_type: String,
    sequence_number: u64,
    event_type: String,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        stream_id: Uuid,
        stream_type: impl Into<String>,
        sequence_number: u64,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            stream_id,
            stream_type: stream_type.into(),
            sequence_number,
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn stream_type(&self) -> &str {
        &self.stream_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// True for the first event of a stream.
    pub fn opens_stream(&self) -> bool {
        self.sequence_number == 1
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn exposes_stream_position_and_type() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            "goods_costing",
            1,
            "workflow.document.draft_created",
            at,
            42u8,
        );

        assert!(env.opens_stream());
        assert_eq!(env.stream_type(), "goods_costing");
        assert_eq!(env.event_type(), "workflow.document.draft_created");
        assert_eq!(env.occurred_at(), at);
        assert_eq!(env.into_payload(), 42);
    }
}
