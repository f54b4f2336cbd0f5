//! Read-only projections computed from a snapshot.

mod join;
mod roster;
mod specialty;

pub use join::*;
pub use roster::*;
pub use specialty::*;

use crate::store::Snapshot;

/// Header counts shown above each list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Counts {
    pub patients: usize,
    pub doctors: usize,
    pub appointments: usize,
    pub visit_notes: usize,
}

impl Counts {
    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            patients: snapshot.patients.len(),
            doctors: snapshot.doctors.len(),
            appointments: snapshot.appointments.len(),
            visit_notes: snapshot.visit_notes.len(),
        }
    }
}
