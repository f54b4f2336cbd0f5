//! Appointment statistics rows.

use serde::{Deserialize, Serialize};

use super::{wire, EntityId};

/// One row of the per-patient appointment count report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Stat {
    pub patient_id: EntityId,
    pub name: String,
    #[serde(deserialize_with = "wire::count::deserialize")]
    pub total_appointments: u64,
}
