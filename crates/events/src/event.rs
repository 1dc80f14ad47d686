use chrono::{DateTime, Utc};

/// A fact recorded in a document stream. Never mutated once appended.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name persisted with the event, e.g. `workflow.document.submitted`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version, bumped when the serialised shape changes.
    fn version(&self) -> u32;

    /// Business time of the transition.
    fn occurred_at(&self) -> DateTime<Utc>;
}
