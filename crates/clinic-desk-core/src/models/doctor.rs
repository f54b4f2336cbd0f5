//! Doctor models.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// A doctor on the medical staff.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Doctor {
    /// Backend-assigned ID
    pub id: EntityId,
    /// Name without the "Dr." prefix
    pub name: String,
    /// Free-text specialty (suggested from [`crate::views::SPECIALTIES`])
    #[serde(default)]
    pub specialty: String,
}

/// Doctor data embedded in an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DoctorRef {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

impl Doctor {
    /// Name as displayed on the roster.
    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.name)
    }

    /// Embedded copy of this doctor.
    pub fn to_ref(&self) -> DoctorRef {
        DoctorRef {
            id: self.id,
            name: self.name.clone(),
            specialty: Some(self.specialty.clone()).filter(|s| !s.is_empty()),
        }
    }
}
