//! Form state for the create screens and its coercion into requests.

use serde::{Deserialize, Serialize};

use super::{Mutation, MutationError, MutationResult};
use crate::api::{NewAppointment, NewDoctor, NewPatient, NewVisitNote};
use crate::models::{wire, EntityId};

/// Input captured by a create form, kept as the text the user typed.
pub trait Form: Default {
    /// Coerce the input into a request. Fails without side effects.
    fn to_mutation(&self) -> MutationResult<Mutation>;

    /// Reset every field after a successful submit.
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub name: String,
    pub email: String,
    /// `YYYY-MM-DD`
    pub birthdate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctorForm {
    pub name: String,
    pub specialty: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentForm {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    /// Selected patient id, as the selector value
    pub patient_id: String,
    /// Selected doctor id, as the selector value
    pub doctor_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitNoteForm {
    /// Selected appointment id, as the selector value
    pub appointment_id: String,
    pub note: String,
    pub prescription: String,
}

impl Form for PatientForm {
    fn to_mutation(&self) -> MutationResult<Mutation> {
        Ok(Mutation::CreatePatient(NewPatient {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            birthdate: wire::parse_date(&self.birthdate)
                .ok_or_else(|| invalid("birthdate", &self.birthdate, "a YYYY-MM-DD date"))?,
        }))
    }
}

impl Form for DoctorForm {
    fn to_mutation(&self) -> MutationResult<Mutation> {
        Ok(Mutation::CreateDoctor(NewDoctor {
            name: self.name.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
        }))
    }
}

impl Form for AppointmentForm {
    fn to_mutation(&self) -> MutationResult<Mutation> {
        Ok(Mutation::CreateAppointment(NewAppointment {
            date: wire::parse_date(&self.date)
                .ok_or_else(|| invalid("date", &self.date, "a YYYY-MM-DD date"))?,
            time: wire::parse_time(&self.time)
                .ok_or_else(|| invalid("time", &self.time, "an HH:MM time"))?,
            patient_id: coerce_id("patientId", &self.patient_id)?,
            doctor_id: coerce_id("doctorId", &self.doctor_id)?,
        }))
    }
}

impl Form for VisitNoteForm {
    fn to_mutation(&self) -> MutationResult<Mutation> {
        Ok(Mutation::CreateVisitNote(NewVisitNote {
            appointment_id: coerce_id("appointmentId", &self.appointment_id)?,
            note: self.note.clone(),
            prescription: self.prescription.clone(),
        }))
    }
}

/// Coerce a selector value into a numeric foreign key.
pub fn coerce_id(field: &str, raw: &str) -> MutationResult<EntityId> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(field, raw, "a numeric id"))
}

fn invalid(field: &str, raw: &str, expected: &str) -> MutationError {
    MutationError::InvalidInput(format!("{field} must be {expected}, got {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_coerce_id() {
        assert_eq!(coerce_id("patientId", "12").unwrap(), 12);
        assert_eq!(coerce_id("patientId", " 7 ").unwrap(), 7);
        assert!(coerce_id("patientId", "").is_err());
        assert!(coerce_id("patientId", "-1").is_err());
        assert!(coerce_id("patientId", "1.5").is_err());
    }

    #[test]
    fn test_appointment_form_coerces_ids() {
        let form = AppointmentForm {
            date: "2024-05-01".into(),
            time: "10:15".into(),
            patient_id: "3".into(),
            doctor_id: "8".into(),
        };
        match form.to_mutation().unwrap() {
            Mutation::CreateAppointment(body) => {
                assert_eq!(body.patient_id, 3);
                assert_eq!(body.doctor_id, 8);
                assert_eq!(body.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
            }
            other => panic!("unexpected mutation: {other:?}"),
        }
    }

    #[test]
    fn test_unselected_patient_is_rejected() {
        let form = AppointmentForm {
            date: "2024-05-01".into(),
            time: "10:15".into(),
            patient_id: String::new(),
            doctor_id: "8".into(),
        };
        let err = form.to_mutation().unwrap_err();
        assert!(err.to_string().contains("patientId"));
    }

    #[test]
    fn test_patient_form_requires_date() {
        let form = PatientForm {
            name: "A".into(),
            email: "a@x.com".into(),
            birthdate: "01/01/2000".into(),
        };
        assert!(matches!(form.to_mutation(), Err(MutationError::InvalidInput(_))));
    }

    #[test]
    fn test_appointment_date_with_trailing_text_is_rejected() {
        let form = AppointmentForm {
            date: "2024-01-15junk".into(),
            time: "10:15".into(),
            patient_id: "3".into(),
            doctor_id: "8".into(),
        };
        assert!(matches!(form.to_mutation(), Err(MutationError::InvalidInput(_))));
    }

    #[test]
    fn test_clear_resets_fields() {
        let mut form = VisitNoteForm {
            appointment_id: "4".into(),
            note: "Rest".into(),
            prescription: "None".into(),
        };
        form.clear();
        assert_eq!(form, VisitNoteForm::default());
    }
}
