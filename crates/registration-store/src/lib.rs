//! Registration store.
//!
//! The only component allowed to change an event's attendee count. Every
//! mutation inserts or deletes one registration and rewrites the owning
//! event's count in the same atomic unit, serialized per event.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{EventId, RegistrationId};
pub use error::{Result, StoreError};
pub use memory::InMemoryRegistrationStore;
pub use postgres::PostgresRegistrationStore;
pub use store::{
    AdmissionOutcome, CancellationOutcome, CancelledRegistration, EventSnapshot,
    RegistrationStore, RegistrationStoreExt,
};
