//! Domain models mirrored from the scheduling backend.

mod appointment;
mod doctor;
mod patient;
mod stat;
mod visit_note;
pub(crate) mod wire;

pub use appointment::*;
pub use doctor::*;
pub use patient::*;
pub use stat::*;
pub use visit_note::*;

/// Backend-assigned identifier. Never generated on the client.
pub type EntityId = u64;
