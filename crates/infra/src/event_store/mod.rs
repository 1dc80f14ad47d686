//! Append-only document event store.
//!
//! One stream per document. The stream is the record of truth for the document:
//! its current state is whatever replaying the stream yields.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
