//! Patient models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{wire, EntityId};

/// A registered patient as returned by `GET /patients`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Patient {
    /// Backend-assigned ID
    pub id: EntityId,
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Date of birth
    #[serde(with = "wire::date")]
    pub birthdate: NaiveDate,
}

/// Patient data embedded in an appointment.
///
/// Appointment listings only guarantee the id and name of the patient; the
/// copy is taken when the appointment is read and is never kept in sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PatientRef {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Patient {
    /// Age in whole years on the given day.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birthdate).unwrap_or(0)
    }

    /// Embedded copy of this patient.
    pub fn to_ref(&self) -> PatientRef {
        PatientRef {
            id: self.id,
            name: self.name.clone(),
            email: Some(self.email.clone()),
        }
    }
}
