//! Appointment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{wire, DoctorRef, EntityId, PatientRef};

/// A booked appointment with embedded patient and doctor snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Appointment {
    /// Backend-assigned ID
    pub id: EntityId,
    /// Calendar day of the visit
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    /// Start time
    #[serde(with = "wire::time")]
    pub time: NaiveTime,
    /// Patient at booking time
    pub patient: PatientRef,
    /// Doctor at booking time
    pub doctor: DoctorRef,
}

impl Appointment {
    /// Check whether this appointment involves the given patient.
    pub fn is_for_patient(&self, patient_id: EntityId) -> bool {
        self.patient.id == patient_id
    }

    /// Check whether this appointment is with the given doctor.
    pub fn is_with_doctor(&self, doctor_id: EntityId) -> bool {
        self.doctor.id == doctor_id
    }
}
