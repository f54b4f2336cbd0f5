//! Visit note models.

use serde::{Deserialize, Serialize};

use super::{Appointment, EntityId};

/// Observations and prescription recorded for one appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VisitNote {
    /// Backend-assigned ID
    pub id: EntityId,
    /// Observation notes
    #[serde(default)]
    pub note: Option<String>,
    /// Prescription details
    #[serde(default)]
    pub prescription: Option<String>,
    /// Appointment as it was when the note was created
    pub appointment: Appointment,
}

impl VisitNote {
    /// Observation text, treating blank notes as absent.
    pub fn observations(&self) -> Option<&str> {
        non_blank(self.note.as_deref())
    }

    /// Prescription text, treating blank prescriptions as absent.
    pub fn prescribed(&self) -> Option<&str> {
        non_blank(self.prescription.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let json = r#"{"id":5,"note":"  ","prescription":null,
            "appointment":{"id":1,"date":"2024-02-01","time":"09:00",
            "patient":{"id":1,"name":"A"},"doctor":{"id":2,"name":"B"}}}"#;
        let note: VisitNote = serde_json::from_str(json).unwrap();
        assert_eq!(note.observations(), None);
        assert_eq!(note.prescribed(), None);
    }

    #[test]
    fn test_missing_fields_default() {
        let json = r#"{"id":5,"note":"Rest",
            "appointment":{"id":1,"date":"2024-02-01","time":"09:00",
            "patient":{"id":1,"name":"A"},"doctor":{"id":2,"name":"B"}}}"#;
        let note: VisitNote = serde_json::from_str(json).unwrap();
        assert_eq!(note.observations(), Some("Rest"));
        assert_eq!(note.prescription, None);
    }
}
