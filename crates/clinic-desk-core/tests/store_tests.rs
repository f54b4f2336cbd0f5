//! Store and mutation pipeline integration tests over the local backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use clinic_desk_core::api::{ApiError, ApiResult, Backend, ClinicApi};
use clinic_desk_core::db::SqliteBackend;
use clinic_desk_core::mutation::{
    Applied, AppointmentForm, DoctorForm, MutationError, MutationPipeline, PatientForm, PipelineConfig,
    ReloadStatus, VisitNoteForm,
};
use clinic_desk_core::store::{Collection, EntityStore, LoadOutcome, StoreError, ViewScope};
use clinic_desk_core::views::{Counts, VisitNoteSummary};

/// Wraps the local backend with switchable failures and slow reads.
struct ScriptedBackend {
    inner: SqliteBackend,
    fail_gets: AtomicBool,
    gets: AtomicUsize,
    /// GETs with a sequence number below this sleep before answering
    slow_gets: AtomicUsize,
    /// Accept writes but answer with only the new row's id
    terse_posts: AtomicBool,
}

impl ScriptedBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteBackend::in_memory().unwrap(),
            fail_gets: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            slow_gets: AtomicUsize::new(0),
            terse_posts: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        let seq = self.gets.fetch_add(1, Ordering::SeqCst);
        if seq < self.slow_gets.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(ApiError::Transport(format!("connection refused: {path}")));
        }
        self.inner.get(path).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        let created = self.inner.post(path, body).await?;
        if self.terse_posts.load(Ordering::SeqCst) {
            return Ok(json!({ "insertId": created["id"].clone() }));
        }
        Ok(created)
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        self.inner.delete(path).await
    }
}

fn pipeline(backend: Arc<ScriptedBackend>, debounce: Duration) -> MutationPipeline {
    let store = Arc::new(EntityStore::new(ClinicApi::new(backend)));
    MutationPipeline::new(
        store,
        PipelineConfig {
            reload_debounce: debounce,
        },
    )
}

fn patient_form(name: &str) -> PatientForm {
    PatientForm {
        name: name.into(),
        email: format!("{}@x.com", name.to_lowercase()),
        birthdate: "2000-01-01".into(),
    }
}

/// Seed one patient, one doctor, one appointment; returns the appointment id.
async fn seed(pipeline: &MutationPipeline) -> String {
    pipeline.submit(&mut patient_form("Ada")).await.unwrap();
    pipeline
        .submit(&mut DoctorForm {
            name: "Grey".into(),
            specialty: "Surgeon".into(),
        })
        .await
        .unwrap();
    let snapshot = pipeline.store().snapshot();
    let mut form = AppointmentForm {
        date: "2024-01-15".into(),
        time: "14:00".into(),
        patient_id: snapshot.patients[0].id.to_string(),
        doctor_id: snapshot.doctors[0].id.to_string(),
    };
    pipeline.submit(&mut form).await.unwrap();
    pipeline.store().snapshot().appointments[0].id.to_string()
}

#[tokio::test]
async fn test_add_patient_adds_exactly_one() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend, Duration::ZERO);
    pipeline.store().load_all().await.unwrap();
    let before = pipeline.store().snapshot().patients.len();

    let mut form = PatientForm {
        name: "A".into(),
        email: "a@x.com".into(),
        birthdate: "2000-01-01".into(),
    };
    let outcome = pipeline.submit(&mut form).await.unwrap();

    assert!(outcome.reloaded());
    assert_eq!(form, PatientForm::default());
    let snapshot = pipeline.store().snapshot();
    assert_eq!(snapshot.patients.len(), before + 1);
    let added = snapshot.patients.iter().find(|p| p.name == "A").unwrap();
    assert!(added.id > 0);
    assert_eq!(added.email, "a@x.com");
    // New patients show up in the report with zero visits
    assert!(snapshot.stats.iter().any(|s| s.patient_id == added.id && s.total_appointments == 0));
}

#[tokio::test]
async fn test_booking_updates_stats_and_joins() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend, Duration::ZERO);
    seed(&pipeline).await;

    let snapshot = pipeline.store().snapshot();
    assert_eq!(snapshot.stats.len(), 1);
    assert_eq!(snapshot.stats[0].total_appointments, 1);
    assert_eq!(snapshot.appointments[0].patient.name, "Ada");
    assert_eq!(snapshot.appointments[0].doctor.name, "Grey");
}

#[tokio::test]
async fn test_delete_note_touches_only_notes() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend, Duration::ZERO);
    let appointment_id = seed(&pipeline).await;

    let mut note = VisitNoteForm {
        appointment_id,
        note: "Stable".into(),
        prescription: String::new(),
    };
    pipeline.submit(&mut note).await.unwrap();
    let before = pipeline.store().snapshot();
    assert_eq!(before.visit_notes.len(), 1);
    let summary = VisitNoteSummary::of(&before.visit_notes[0]);
    assert_eq!(summary.prescription, "No prescription");

    pipeline
        .delete_visit_note(before.visit_notes[0].id)
        .await
        .unwrap();

    let after = pipeline.store().snapshot();
    assert!(after.visit_notes.is_empty());
    assert_eq!(after.patients, before.patients);
    assert_eq!(after.doctors, before.doctors);
    assert_eq!(after.appointments, before.appointments);
    assert_eq!(after.stats, before.stats);
    assert_eq!(
        Counts::of(&after),
        Counts {
            patients: 1,
            doctors: 1,
            appointments: 1,
            visit_notes: 0
        }
    );
}

#[tokio::test]
async fn test_invalid_form_keeps_input_and_sends_nothing() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend.clone(), Duration::ZERO);

    let mut form = AppointmentForm {
        date: "2024-01-15".into(),
        time: "14:00".into(),
        patient_id: "not-a-number".into(),
        doctor_id: "1".into(),
    };
    let original = form.clone();
    let err = pipeline.submit(&mut form).await.unwrap_err();

    assert!(matches!(err, MutationError::InvalidInput(_)));
    assert_eq!(form, original);
    assert_eq!(backend.gets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_write_keeps_input() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend, Duration::ZERO);

    let mut form = VisitNoteForm {
        appointment_id: "42".into(),
        note: "Orphan".into(),
        prescription: String::new(),
    };
    let err = pipeline.submit(&mut form).await.unwrap_err();

    match err {
        MutationError::Api(ApiError::Status { status, .. }) => assert_eq!(status, 400),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(form.note, "Orphan");
}

#[tokio::test]
async fn test_failed_first_load_leaves_empty_snapshot() {
    let backend = ScriptedBackend::new();
    backend.fail_gets.store(true, Ordering::SeqCst);
    let store = EntityStore::new(ClinicApi::new(backend));

    let err = store.load_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Fetch { .. }));
    let snapshot = store.snapshot();
    assert!(!snapshot.is_loaded());
    assert!(snapshot.patients.is_empty());
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_snapshot() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend.clone(), Duration::ZERO);
    seed(&pipeline).await;
    let before = pipeline.store().snapshot();

    backend.fail_gets.store(true, Ordering::SeqCst);
    let outcome = pipeline.submit(&mut patient_form("Bo")).await.unwrap();

    // The write landed but the reload did not
    assert!(matches!(outcome.reload, ReloadStatus::Failed(_)));
    let after = pipeline.store().snapshot();
    assert_eq!(after.generation, before.generation);
    assert!(after.same_content(&before));

    backend.fail_gets.store(false, Ordering::SeqCst);
    pipeline.store().load_all().await.unwrap();
    assert_eq!(pipeline.store().snapshot().patients.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_slow_older_load_is_superseded() {
    let backend = ScriptedBackend::new();
    backend.slow_gets.store(1, Ordering::SeqCst);
    let store = EntityStore::new(ClinicApi::new(backend));

    let (older, newer) = tokio::join!(
        store.load(&[Collection::Patients]),
        store.load(&[Collection::Patients]),
    );

    assert_eq!(newer.unwrap(), LoadOutcome::Installed { generation: 2 });
    assert_eq!(
        older.unwrap(),
        LoadOutcome::Superseded {
            generation: 1,
            current: 2
        }
    );
    assert_eq!(store.snapshot().generation, 2);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_reloads_of_different_collections_both_land() {
    let backend = ScriptedBackend::new();
    // The patient reload (patients + stats) answers after the doctor reload
    backend.slow_gets.store(2, Ordering::SeqCst);
    let pipeline = pipeline(backend, Duration::ZERO);

    let mut patient = patient_form("Ada");
    let mut doctor = DoctorForm {
        name: "Grey".into(),
        specialty: "Surgeon".into(),
    };
    let (a, b) = tokio::join!(pipeline.submit(&mut patient), pipeline.submit(&mut doctor));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(matches!(b.reload, ReloadStatus::Completed(LoadOutcome::Installed { generation: 2 })));
    assert!(matches!(a.reload, ReloadStatus::Completed(LoadOutcome::Installed { generation: 1 })));
    let snapshot = pipeline.store().snapshot();
    assert_eq!(snapshot.patients.len(), 1);
    assert_eq!(snapshot.doctors.len(), 1);
    assert_eq!(snapshot.stats.len(), 1);
    assert_eq!(snapshot.generation, 2);
}

#[tokio::test]
async fn test_accepted_write_with_terse_reply_still_clears_and_reloads() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend.clone(), Duration::ZERO);
    seed(&pipeline).await;
    let snapshot = pipeline.store().snapshot();
    backend.terse_posts.store(true, Ordering::SeqCst);

    let mut form = AppointmentForm {
        date: "2024-02-01".into(),
        time: "09:30".into(),
        patient_id: snapshot.patients[0].id.to_string(),
        doctor_id: snapshot.doctors[0].id.to_string(),
    };
    let outcome = pipeline.submit(&mut form).await.unwrap();

    assert_eq!(outcome.applied, Applied::Appointment(None));
    assert!(!outcome.applied.has_record());
    assert!(outcome.reloaded());
    assert_eq!(form, AppointmentForm::default());
    let snapshot = pipeline.store().snapshot();
    assert_eq!(snapshot.appointments.len(), 2);
    assert_eq!(snapshot.stats[0].total_appointments, 2);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_submits_coalesce_into_one_reload() {
    let backend = ScriptedBackend::new();
    let pipeline = pipeline(backend.clone(), Duration::from_millis(150));

    let mut first = patient_form("Ada");
    let mut second = DoctorForm {
        name: "Grey".into(),
        specialty: "Surgeon".into(),
    };
    let (a, b) = tokio::join!(pipeline.submit(&mut first), pipeline.submit(&mut second));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(matches!(a.reload, ReloadStatus::Coalesced));
    assert!(b.reloaded());
    assert_ne!(a.submission_id, b.submission_id);

    // One reload covering patients, stats and doctors
    assert_eq!(backend.gets.load(Ordering::SeqCst), 3);
    let snapshot = pipeline.store().snapshot();
    assert_eq!(snapshot.patients.len(), 1);
    assert_eq!(snapshot.doctors.len(), 1);
    assert_eq!(snapshot.stats.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closing_the_view_drops_the_reload() {
    let backend = ScriptedBackend::new();
    backend.slow_gets.store(usize::MAX, Ordering::SeqCst);
    let store = Arc::new(EntityStore::new(ClinicApi::new(backend)));
    let scope = Arc::new(ViewScope::new());

    let load = {
        let store = store.clone();
        let scope = scope.clone();
        tokio::spawn(async move { store.load_scoped(&Collection::ALL, &scope).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    scope.close();

    let result = load.await.unwrap();
    assert!(matches!(result, Err(StoreError::Cancelled)));
    assert!(!store.snapshot().is_loaded());
}

#[tokio::test]
async fn test_on_disk_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db");

    {
        let backend = Arc::new(SqliteBackend::open(&path).unwrap());
        let store = Arc::new(EntityStore::new(ClinicApi::new(backend)));
        let pipeline = MutationPipeline::new(store, PipelineConfig::default());
        pipeline.submit(&mut patient_form("Ada")).await.unwrap();
    }

    let backend = Arc::new(SqliteBackend::open(&path).unwrap());
    let store = EntityStore::new(ClinicApi::new(backend));
    store.load_all().await.unwrap();
    assert_eq!(store.snapshot().patients[0].name, "Ada");
}
