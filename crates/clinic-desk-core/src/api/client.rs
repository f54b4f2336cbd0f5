//! Typed client over a [`Backend`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{routes, ApiError, ApiResult, Backend, NewAppointment, NewDoctor, NewPatient, NewVisitNote};
use crate::models::{Appointment, Doctor, EntityId, Patient, Stat, VisitNote};

/// Typed access to every route the client consumes.
#[derive(Clone)]
pub struct ClinicApi {
    backend: Arc<dyn Backend>,
}

impl ClinicApi {
    /// Wrap a backend.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub async fn list_patients(&self) -> ApiResult<Vec<Patient>> {
        self.get_json(routes::PATIENTS).await
    }

    pub async fn list_doctors(&self) -> ApiResult<Vec<Doctor>> {
        self.get_json(routes::DOCTORS).await
    }

    pub async fn list_appointments(&self) -> ApiResult<Vec<Appointment>> {
        self.get_json(routes::APPOINTMENTS).await
    }

    pub async fn list_visit_notes(&self) -> ApiResult<Vec<VisitNote>> {
        self.get_json(routes::VISIT_NOTES).await
    }

    /// Fetch the stored-procedure report, unwrapping its extra nesting level.
    pub async fn appointment_stats(&self) -> ApiResult<Vec<Stat>> {
        let path = routes::APPOINTMENT_STATS;
        let body = self.backend.get(path).await?;
        unwrap_procedure_result(path, body)
    }

    // =========================================================================
    // Mutations
    // =========================================================================
    //
    // A create only fails when the backend did not accept the write. If it
    // did, but its echo of the record does not decode, the result is `None`.

    pub async fn create_patient(&self, patient: &NewPatient) -> ApiResult<Option<Patient>> {
        self.post_json(routes::PATIENTS, patient).await
    }

    pub async fn create_doctor(&self, doctor: &NewDoctor) -> ApiResult<Option<Doctor>> {
        self.post_json(routes::DOCTORS, doctor).await
    }

    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> ApiResult<Option<Appointment>> {
        self.post_json(routes::APPOINTMENTS, appointment).await
    }

    pub async fn create_visit_note(&self, note: &NewVisitNote) -> ApiResult<Option<VisitNote>> {
        self.post_json(routes::VISIT_NOTES, note).await
    }

    pub async fn delete_visit_note(&self, id: EntityId) -> ApiResult<()> {
        self.backend.delete(&routes::visit_note(id)).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let body = self.backend.get(path).await?;
        debug!(path, "decoding response");
        serde_json::from_value(body).map_err(|e| ApiError::decode(path, e))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<Option<T>> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::decode(path, e))?;
        let created = self.backend.post(path, body).await?;
        match serde_json::from_value(created) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path, error = %e, "write accepted but the created record did not decode");
                Ok(None)
            }
        }
    }
}

/// Take the row set out of a stored-procedure response.
///
/// The procedure call answers `[rows, metadata]`; only `rows` is used. An
/// empty outer array means the procedure produced no result set.
pub fn unwrap_procedure_result(path: &str, body: Value) -> ApiResult<Vec<Stat>> {
    let Value::Array(mut sets) = body else {
        return Err(ApiError::decode(path, "expected an array of result sets"));
    };
    if sets.is_empty() {
        return Ok(Vec::new());
    }
    match sets.swap_remove(0) {
        rows @ Value::Array(_) => serde_json::from_value(rows).map_err(|e| ApiError::decode(path, e)),
        _ => Err(ApiError::decode(path, "first result set is not an array")),
    }
}
