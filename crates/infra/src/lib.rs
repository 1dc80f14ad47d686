//! Infrastructure layer: document store, approval engine, collaborators, config.

pub mod approvals;
pub mod config;
pub mod error;
pub mod event_store;
pub mod products;
pub mod role_directory;


pub use approvals::{ApprovalEngine, Document};
pub use config::{EngineConfig, load_access_policy, load_engine_config};
pub use error::ApprovalError;
pub use event_store::{EventStore, EventStoreError, InMemoryEventStore, StoredEvent};
pub use products::{InMemoryProductCatalog, PriceSink, PriceSinkError, Product};
pub use role_directory::SharedRoleRegistry;
