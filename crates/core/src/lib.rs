//! `bazaar-core`: identifiers, domain errors and the aggregate contract shared
//! by every other crate. No I/O lives here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, ProductId, UserId};
