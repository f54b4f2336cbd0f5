//! Write path: submit one request, then reload what it touched.
//!
//! Pipeline: Form → coerce → POST/DELETE → clear form → debounce → reload
//!
//! Reloads are debounced: when several submits land inside the debounce
//! window, only the last one reloads, and it reloads the union of the
//! collections the others touched.

mod forms;

pub use forms::*;

use std::collections::BTreeSet;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ApiError, NewAppointment, NewDoctor, NewPatient, NewVisitNote};
use crate::models::{Appointment, Doctor, EntityId, Patient, VisitNote};
use crate::store::{Collection, EntityStore, LoadOutcome, StoreError, ViewScope};

/// Default wait before reloading after a write.
pub const DEFAULT_RELOAD_DEBOUNCE: Duration = Duration::from_millis(150);

/// Mutation errors.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Lock poisoned")]
    LockPoisoned,
}

pub type MutationResult<T> = Result<T, MutationError>;

impl<T> From<std::sync::PoisonError<T>> for MutationError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        MutationError::LockPoisoned
    }
}

/// A single write against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreatePatient(NewPatient),
    CreateDoctor(NewDoctor),
    CreateAppointment(NewAppointment),
    CreateVisitNote(NewVisitNote),
    DeleteVisitNote(EntityId),
}

impl Mutation {
    /// Collections whose backend state this write changes.
    pub fn affected(&self) -> &'static [Collection] {
        match self {
            Self::CreatePatient(_) => &[Collection::Patients, Collection::Stats],
            Self::CreateDoctor(_) => &[Collection::Doctors],
            Self::CreateAppointment(_) => &[Collection::Appointments, Collection::Stats],
            Self::CreateVisitNote(_) | Self::DeleteVisitNote(_) => &[Collection::VisitNotes],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreatePatient(_) => "create_patient",
            Self::CreateDoctor(_) => "create_doctor",
            Self::CreateAppointment(_) => "create_appointment",
            Self::CreateVisitNote(_) => "create_visit_note",
            Self::DeleteVisitNote(_) => "delete_visit_note",
        }
    }
}

/// What the backend returned for a write.
///
/// A create carries `None` when the backend accepted it but answered with a
/// body that is not a full record; the reload still picks the row up.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Patient(Option<Patient>),
    Doctor(Option<Doctor>),
    Appointment(Option<Appointment>),
    VisitNote(Option<VisitNote>),
    Deleted(EntityId),
}

impl Applied {
    /// Whether the backend echoed back a usable record (deletes always do).
    pub fn has_record(&self) -> bool {
        match self {
            Self::Patient(p) => p.is_some(),
            Self::Doctor(d) => d.is_some(),
            Self::Appointment(a) => a.is_some(),
            Self::VisitNote(n) => n.is_some(),
            Self::Deleted(_) => true,
        }
    }
}

/// What happened to the reload that follows a write.
#[derive(Debug)]
pub enum ReloadStatus {
    /// This submit ran the reload.
    Completed(LoadOutcome),
    /// A later submit took over the reload.
    Coalesced,
    /// The write succeeded but the reload failed; the previous snapshot stays.
    Failed(StoreError),
}

/// Result of a successful write.
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Correlates the log lines of one submission
    pub submission_id: Uuid,
    pub applied: Applied,
    pub reload: ReloadStatus,
}

impl SubmitOutcome {
    /// Whether this call performed the reload itself.
    pub fn reloaded(&self) -> bool {
        matches!(self.reload, ReloadStatus::Completed(_))
    }
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wait after a write before reloading; zero reloads immediately
    pub reload_debounce: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reload_debounce: DEFAULT_RELOAD_DEBOUNCE,
        }
    }
}

#[derive(Default)]
struct PendingReload {
    ticket: u64,
    collections: BTreeSet<Collection>,
}

/// Submits writes and keeps the store in step with them.
///
/// There is no idempotency key: retrying a failed submit sends a new create.
pub struct MutationPipeline {
    store: Arc<EntityStore>,
    config: PipelineConfig,
    scope: Option<Arc<ViewScope>>,
    pending: Mutex<PendingReload>,
}

impl MutationPipeline {
    /// Create a pipeline writing through the store's API.
    pub fn new(store: Arc<EntityStore>, config: PipelineConfig) -> Self {
        Self {
            store,
            config,
            scope: None,
            pending: Mutex::new(PendingReload::default()),
        }
    }

    /// Tie reloads to a view; once it closes, reloads are dropped.
    pub fn with_scope(mut self, scope: Arc<ViewScope>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Submit a form. On success the form is cleared; on failure it keeps
    /// the user's input.
    pub async fn submit<F: Form>(&self, form: &mut F) -> MutationResult<SubmitOutcome> {
        let mutation = form.to_mutation()?;
        let submission_id = Uuid::new_v4();
        let applied = self.apply(submission_id, &mutation).await?;
        form.clear();
        let reload = self.reload_after(submission_id, mutation.affected()).await?;
        Ok(SubmitOutcome {
            submission_id,
            applied,
            reload,
        })
    }

    /// Delete a visit note by id.
    pub async fn delete_visit_note(&self, id: EntityId) -> MutationResult<SubmitOutcome> {
        self.run(Mutation::DeleteVisitNote(id)).await
    }

    /// Submit an already-built mutation.
    pub async fn run(&self, mutation: Mutation) -> MutationResult<SubmitOutcome> {
        let submission_id = Uuid::new_v4();
        let applied = self.apply(submission_id, &mutation).await?;
        let reload = self.reload_after(submission_id, mutation.affected()).await?;
        Ok(SubmitOutcome {
            submission_id,
            applied,
            reload,
        })
    }

    async fn apply(&self, submission_id: Uuid, mutation: &Mutation) -> MutationResult<Applied> {
        let api = self.store.api();
        info!(%submission_id, kind = mutation.kind(), "submitting mutation");

        let result = match mutation {
            Mutation::CreatePatient(body) => api.create_patient(body).await.map(Applied::Patient),
            Mutation::CreateDoctor(body) => api.create_doctor(body).await.map(Applied::Doctor),
            Mutation::CreateAppointment(body) => {
                api.create_appointment(body).await.map(Applied::Appointment)
            }
            Mutation::CreateVisitNote(body) => api.create_visit_note(body).await.map(Applied::VisitNote),
            Mutation::DeleteVisitNote(id) => api.delete_visit_note(*id).await.map(|()| Applied::Deleted(*id)),
        };

        result.map_err(|e| {
            warn!(%submission_id, kind = mutation.kind(), error = %e, "mutation failed");
            MutationError::from(e)
        })
    }

    async fn reload_after(
        &self,
        submission_id: Uuid,
        affected: &[Collection],
    ) -> MutationResult<ReloadStatus> {
        let ticket = {
            let mut pending = self.pending.lock()?;
            pending.ticket += 1;
            pending.collections.extend(affected.iter().copied());
            pending.ticket
        };

        if !self.config.reload_debounce.is_zero() {
            tokio::time::sleep(self.config.reload_debounce).await;
        }

        let collections: Vec<Collection> = {
            let mut pending = self.pending.lock()?;
            if pending.ticket != ticket {
                debug!(%submission_id, "reload coalesced into a later submit");
                return Ok(ReloadStatus::Coalesced);
            }
            mem::take(&mut pending.collections).into_iter().collect()
        };

        let result = match &self.scope {
            Some(scope) => self.store.load_scoped(&collections, scope).await,
            None => self.store.load(&collections).await,
        };

        Ok(match result {
            Ok(outcome) => ReloadStatus::Completed(outcome),
            Err(e) => {
                warn!(%submission_id, error = %e, "reload after mutation failed");
                ReloadStatus::Failed(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affected_collections() {
        assert_eq!(
            Mutation::DeleteVisitNote(1).affected(),
            &[Collection::VisitNotes]
        );
        let patient = Mutation::CreatePatient(NewPatient {
            name: "A".into(),
            email: "a@x.com".into(),
            birthdate: chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        });
        assert!(patient.affected().contains(&Collection::Patients));
        assert!(patient.affected().contains(&Collection::Stats));
        assert_eq!(patient.kind(), "create_patient");
    }

    #[test]
    fn test_default_debounce() {
        assert_eq!(PipelineConfig::default().reload_debounce, DEFAULT_RELOAD_DEBOUNCE);
    }
}
