//! Display summaries that join an entity with its embedded references.
//!
//! All dates and times go through [`format_date`] and [`format_time`] so every
//! screen renders them the same way (en-US, `M/D/YYYY` and 24-hour `HH:MM`).

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::{Appointment, EntityId, Patient, VisitNote};

/// en-US calendar date without zero padding, e.g. `3/7/2024`.
pub const DATE_DISPLAY_FORMAT: &str = "%-m/%-d/%Y";
pub const TIME_DISPLAY_FORMAT: &str = "%H:%M";

pub const NO_OBSERVATIONS: &str = "No observations";
pub const NO_PRESCRIPTION: &str = "No prescription";

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_DISPLAY_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_DISPLAY_FORMAT).to_string()
}

/// "Patient with Dr. Doctor" line of an appointment.
pub fn participants(patient_name: &str, doctor_name: &str) -> String {
    format!("{patient_name} with Dr. {doctor_name}")
}

/// An appointment joined with its patient and doctor names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentSummary {
    pub appointment_id: EntityId,
    pub date: String,
    pub time: String,
    pub patient_name: String,
    pub doctor_name: String,
}

impl AppointmentSummary {
    pub fn of(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            date: format_date(appointment.date),
            time: format_time(appointment.time),
            patient_name: appointment.patient.name.clone(),
            doctor_name: appointment.doctor.name.clone(),
        }
    }

    pub fn participants(&self) -> String {
        participants(&self.patient_name, &self.doctor_name)
    }
}

impl std::fmt::Display for AppointmentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} - {}", self.date, self.time, self.participants())
    }
}

/// A visit note joined with its appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitNoteSummary {
    pub note_id: EntityId,
    pub appointment: AppointmentSummary,
    /// Observations, or [`NO_OBSERVATIONS`]
    pub observations: String,
    /// Prescription, or [`NO_PRESCRIPTION`]
    pub prescription: String,
}

impl VisitNoteSummary {
    pub fn of(note: &VisitNote) -> Self {
        Self {
            note_id: note.id,
            appointment: AppointmentSummary::of(&note.appointment),
            observations: note.observations().unwrap_or(NO_OBSERVATIONS).to_string(),
            prescription: note.prescribed().unwrap_or(NO_PRESCRIPTION).to_string(),
        }
    }
}

impl std::fmt::Display for VisitNoteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.appointment)?;
        writeln!(f, "  Observations: {}", self.observations)?;
        write!(f, "  Prescription: {}", self.prescription)
    }
}

/// Selector entries `(id, label)` for choosing an appointment.
pub fn appointment_options(appointments: &[Appointment]) -> Vec<(EntityId, String)> {
    appointments
        .iter()
        .map(|a| (a.id, AppointmentSummary::of(a).to_string()))
        .collect()
}

/// One line of the patient list.
pub fn patient_line(patient: &Patient) -> String {
    format!(
        "{} - {} - {}",
        patient.name,
        patient.email,
        format_date(patient.birthdate)
    )
}
