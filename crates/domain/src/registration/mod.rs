//! Event and registration records.

mod model;
mod value_objects;

pub use model::{Event, NewRegistration, Registration};
pub use value_objects::{Contact, Locale, PartySize};
