//! Clinic Desk Core Library
//!
//! Client-side core of a clinic scheduling desk: an in-memory mirror of the
//! backend's patients, doctors, appointments, visit notes and per-patient
//! appointment statistics, plus the pure projections the screens render.
//!
//! # Architecture
//!
//! ```text
//!   Form input ──► MutationPipeline ──► Backend (HTTP or SQLite)
//!                        │                     │
//!                        │ debounced reload    │ GET collections
//!                        ▼                     ▼
//!                  EntityStore ◄──── try_join fan-out
//!                        │
//!                        │ watch::Receiver<Arc<Snapshot>>
//!                        ▼
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//!   Roster views     Join summaries    Stats aggregation
//! ```
//!
//! # Core Principle
//!
//! **Views never hold their own copy of the data.** Every screen reads the
//! current [`Snapshot`]; a mutation is reflected only after the store reloads.
//!
//! # Modules
//!
//! - [`api`]: Backend seam, routes and typed client
//! - [`db`]: In-process SQLite backend
//! - [`models`]: Domain types (Patient, Doctor, Appointment, VisitNote, Stat)
//! - [`store`]: Snapshot store with generation-ordered loads
//! - [`mutation`]: Form submission and post-mutation reload
//! - [`views`]: Roster filtering/sorting and joined summaries
//! - [`stats`]: Appointment statistics aggregation

pub mod api;
pub mod db;
pub mod models;
pub mod mutation;
pub mod stats;
pub mod store;
pub mod views;

// Re-export commonly used types
pub use api::{ApiError, Backend, ClinicApi};
pub use db::{Database, SqliteBackend};
pub use models::{Appointment, Doctor, EntityId, Patient, Stat, VisitNote};
pub use mutation::{
    AppointmentForm, DoctorForm, Form, MutationError, MutationPipeline, PatientForm,
    PipelineConfig, VisitNoteForm,
};
pub use stats::{Severity, StatsView};
pub use store::{Collection, EntityStore, Snapshot, ViewScope};
pub use views::{RosterQuery, SortDirection};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicDeskError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ClinicDeskError {
    fn from(e: serde_json::Error) -> Self {
        ClinicDeskError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Exported Projections
// =========================================================================

/// Filter and sort a doctor roster.
#[uniffi::export]
pub fn filter_doctors(doctors: Vec<FfiDoctor>, query: FfiRosterQuery) -> Vec<FfiDoctor> {
    let doctors: Vec<Doctor> = doctors.into_iter().map(Into::into).collect();
    let query = RosterQuery::from(query);
    query.apply(&doctors).into_iter().cloned().map(Into::into).collect()
}

/// Filter and sort a patient roster.
#[uniffi::export]
pub fn filter_patients(
    patients: Vec<FfiPatient>,
    query: FfiRosterQuery,
) -> Result<Vec<FfiPatient>, ClinicDeskError> {
    let patients = patients
        .into_iter()
        .map(Patient::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let query = RosterQuery::from(query);
    Ok(query.apply(&patients).into_iter().cloned().map(Into::into).collect())
}

/// Distinct specialties in first-seen order.
#[uniffi::export]
pub fn specialty_options(doctors: Vec<FfiDoctor>) -> Vec<String> {
    let doctors: Vec<Doctor> = doctors.into_iter().map(Into::into).collect();
    views::specialty_options(&doctors)
}

/// Closest predefined specialty for free-text input.
#[uniffi::export]
pub fn suggest_specialty(input: String) -> Option<String> {
    views::suggest_specialty(&input).map(str::to_string)
}

/// Aggregate a stats report into severity buckets and bar widths.
#[uniffi::export]
pub fn aggregate_stats(stats: Vec<FfiStat>) -> FfiStatsView {
    let stats: Vec<Stat> = stats.into_iter().map(Into::into).collect();
    crate::stats::aggregate(&stats).into()
}

/// One display line per appointment, from a `GET /appointments` body.
#[uniffi::export]
pub fn appointment_lines(body: String) -> Result<Vec<String>, ClinicDeskError> {
    let appointments: Vec<Appointment> = serde_json::from_str(&body)?;
    Ok(appointments
        .iter()
        .map(|a| views::AppointmentSummary::of(a).to_string())
        .collect())
}

/// One summary per note, from a `GET /visit-notes` body.
#[uniffi::export]
pub fn visit_note_summaries(body: String) -> Result<Vec<FfiVisitNoteSummary>, ClinicDeskError> {
    let notes: Vec<VisitNote> = serde_json::from_str(&body)?;
    Ok(notes
        .iter()
        .map(|n| views::VisitNoteSummary::of(n).into())
        .collect())
}

// =========================================================================
// FFI Types
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: u64,
    pub name: String,
    pub specialty: String,
}

impl From<Doctor> for FfiDoctor {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            specialty: d.specialty,
        }
    }
}

impl From<FfiDoctor> for Doctor {
    fn from(d: FfiDoctor) -> Self {
        Self {
            id: d.id,
            name: d.name,
            specialty: d.specialty,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// `YYYY-MM-DD`
    pub birthdate: String,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            birthdate: p.birthdate.format("%Y-%m-%d").to_string(),
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = ClinicDeskError;

    fn try_from(p: FfiPatient) -> Result<Self, Self::Error> {
        let birthdate = NaiveDate::parse_from_str(&p.birthdate, "%Y-%m-%d").map_err(|e| {
            ClinicDeskError::InvalidInput(format!("birthdate {:?}: {e}", p.birthdate))
        })?;
        Ok(Self {
            id: p.id,
            name: p.name,
            email: p.email,
            birthdate,
        })
    }
}

#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiSortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRosterQuery {
    pub name_filter: String,
    pub specialty: Option<String>,
    pub direction: FfiSortDirection,
}

impl From<FfiRosterQuery> for RosterQuery {
    fn from(q: FfiRosterQuery) -> Self {
        Self {
            name_filter: q.name_filter,
            specialty: q.specialty,
            direction: match q.direction {
                FfiSortDirection::Asc => SortDirection::Asc,
                FfiSortDirection::Desc => SortDirection::Desc,
            },
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStat {
    pub patient_id: u64,
    pub name: String,
    pub total_appointments: u64,
}

impl From<FfiStat> for Stat {
    fn from(s: FfiStat) -> Self {
        Self {
            patient_id: s.patient_id,
            name: s.name,
            total_appointments: s.total_appointments,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatRow {
    pub patient_id: u64,
    pub name: String,
    pub total_appointments: u64,
    /// "low", "medium" or "high"
    pub severity: String,
    pub scale_percent: f64,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatsView {
    pub max: u64,
    pub total: u64,
    pub rows: Vec<FfiStatRow>,
}

impl From<StatsView> for FfiStatsView {
    fn from(view: StatsView) -> Self {
        Self {
            max: view.max,
            total: view.total,
            rows: view
                .rows
                .into_iter()
                .map(|r| FfiStatRow {
                    patient_id: r.patient_id,
                    name: r.name,
                    total_appointments: r.total_appointments,
                    severity: r.severity.as_str().to_string(),
                    scale_percent: r.scale_percent,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitNoteSummary {
    pub note_id: u64,
    pub appointment: String,
    pub observations: String,
    pub prescription: String,
}

impl From<views::VisitNoteSummary> for FfiVisitNoteSummary {
    fn from(s: views::VisitNoteSummary) -> Self {
        Self {
            note_id: s.note_id,
            appointment: s.appointment.to_string(),
            observations: s.observations,
            prescription: s.prescription,
        }
    }
}
