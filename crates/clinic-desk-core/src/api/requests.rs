//! Request bodies for the create endpoints.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{wire, EntityId};

/// Body of `POST /patients`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    #[serde(with = "wire::date")]
    pub birthdate: NaiveDate,
}

/// Body of `POST /doctors`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
}

/// Body of `POST /appointments`. Foreign keys travel as JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(with = "wire::date")]
    pub date: NaiveDate,
    #[serde(with = "wire::time")]
    pub time: NaiveTime,
    pub patient_id: EntityId,
    pub doctor_id: EntityId,
}

/// Body of `POST /visit-notes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitNote {
    pub appointment_id: EntityId,
    pub note: String,
    pub prescription: String,
}
