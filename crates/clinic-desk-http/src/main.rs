//! `clinic-desk` command-line front end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use clinic_desk_core::api::{Backend, ClinicApi};
use clinic_desk_core::db::SqliteBackend;
use clinic_desk_core::mutation::{
    Applied, AppointmentForm, DoctorForm, Form, MutationPipeline, PatientForm, ReloadStatus,
    SubmitOutcome, VisitNoteForm,
};
use clinic_desk_core::stats::aggregate;
use clinic_desk_core::store::{Collection, EntityStore};
use clinic_desk_core::views::{
    patient_line, specialty_options, suggest_specialty, AppointmentSummary, Counts, RosterQuery,
    SortDirection, VisitNoteSummary,
};
use clinic_desk_http::{ClientConfig, HttpBackend};

/// Width of a full stats bar in characters.
const BAR_WIDTH: f64 = 40.0;

#[derive(Parser, Debug)]
#[command(name = "clinic-desk", version, about = "Clinic scheduling desk")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "CLINIC_DESK_API_URL")]
    api_url: Option<String>,

    /// Use a local SQLite file instead of the HTTP backend
    #[arg(long, global = true, value_name = "PATH")]
    local: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List patients
    Patients {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        desc: bool,
    },
    /// List doctors
    Doctors {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long)]
        desc: bool,
    },
    /// List appointments
    Appointments,
    /// List visit notes
    Notes,
    /// Appointment counts per patient
    Stats,
    /// Register a patient
    AddPatient {
        name: String,
        email: String,
        /// YYYY-MM-DD
        birthdate: String,
    },
    /// Add a doctor
    AddDoctor {
        name: String,
        #[arg(default_value = "")]
        specialty: String,
    },
    /// Book an appointment
    Book {
        /// YYYY-MM-DD
        date: String,
        /// HH:MM
        time: String,
        patient_id: String,
        doctor_id: String,
    },
    /// Record a visit note
    AddNote {
        appointment_id: String,
        #[arg(long, default_value = "")]
        note: String,
        #[arg(long, default_value = "")]
        prescription: String,
    },
    /// Delete a visit note
    DeleteNote { id: u64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = cli.api_url.clone() {
        config = config.with_api_url(url).context("invalid --api-url")?;
    }

    let backend: Arc<dyn Backend> = match &cli.local {
        Some(path) => {
            info!(path = %path.display(), "using local database");
            Arc::new(SqliteBackend::open(path).context("failed to open local database")?)
        }
        None => {
            info!(api_url = %config.api_url, "using HTTP backend");
            Arc::new(HttpBackend::new(&config)?)
        }
    };
    let store = Arc::new(EntityStore::new(ClinicApi::new(backend)));
    let pipeline = MutationPipeline::new(store.clone(), config.pipeline());

    match cli.command {
        Command::Patients { name, desc } => {
            store.load(&[Collection::Patients]).await?;
            let snapshot = store.snapshot();
            let query = RosterQuery::default()
                .with_name(name)
                .with_direction(direction(desc));
            println!("Patients ({})", Counts::of(&snapshot).patients);
            for patient in query.apply(&snapshot.patients) {
                println!("  [{}] {}", patient.id, patient_line(patient));
            }
        }
        Command::Doctors {
            name,
            specialty,
            desc,
        } => {
            store.load(&[Collection::Doctors]).await?;
            let snapshot = store.snapshot();
            let mut query = RosterQuery::default()
                .with_name(name)
                .with_direction(direction(desc));
            if let Some(specialty) = specialty {
                query = query.with_specialty(specialty);
            }
            println!("Doctors ({})", Counts::of(&snapshot).doctors);
            for doctor in query.apply(&snapshot.doctors) {
                println!("  [{}] {} - {}", doctor.id, doctor.display_name(), doctor.specialty);
            }
            let options = specialty_options(&snapshot.doctors);
            if !options.is_empty() {
                println!("Specialties: {}", options.join(", "));
            }
        }
        Command::Appointments => {
            store.load(&[Collection::Appointments]).await?;
            let snapshot = store.snapshot();
            println!("Appointments ({})", Counts::of(&snapshot).appointments);
            for appointment in &snapshot.appointments {
                println!("  [{}] {}", appointment.id, AppointmentSummary::of(appointment));
            }
        }
        Command::Notes => {
            store.load(&[Collection::VisitNotes]).await?;
            let snapshot = store.snapshot();
            println!("Visit notes ({})", Counts::of(&snapshot).visit_notes);
            for note in &snapshot.visit_notes {
                println!("[{}] {}", note.id, VisitNoteSummary::of(note));
            }
        }
        Command::Stats => {
            store.load(&[Collection::Stats]).await?;
            let view = aggregate(&store.snapshot().stats);
            println!("Appointments per patient (total {})", view.total);
            for row in &view.rows {
                let width = (row.scale_percent / 100.0 * BAR_WIDTH).round() as usize;
                println!(
                    "  {:<24} {:>4} {:<6} {}",
                    row.name,
                    row.total_appointments,
                    row.severity.as_str(),
                    "#".repeat(width)
                );
            }
        }
        Command::AddPatient {
            name,
            email,
            birthdate,
        } => {
            let mut form = PatientForm {
                name,
                email,
                birthdate,
            };
            report(submit(&pipeline, &mut form).await?);
        }
        Command::AddDoctor { name, specialty } => {
            if let Some(suggested) = suggest_specialty(&specialty) {
                if suggested != specialty {
                    info!(input = %specialty, suggested, "specialty is close to a known one");
                }
            }
            let mut form = DoctorForm { name, specialty };
            report(submit(&pipeline, &mut form).await?);
        }
        Command::Book {
            date,
            time,
            patient_id,
            doctor_id,
        } => {
            let mut form = AppointmentForm {
                date,
                time,
                patient_id,
                doctor_id,
            };
            report(submit(&pipeline, &mut form).await?);
        }
        Command::AddNote {
            appointment_id,
            note,
            prescription,
        } => {
            let mut form = VisitNoteForm {
                appointment_id,
                note,
                prescription,
            };
            report(submit(&pipeline, &mut form).await?);
        }
        Command::DeleteNote { id } => {
            let outcome = pipeline
                .delete_visit_note(id)
                .await
                .with_context(|| format!("failed to delete visit note {id}"))?;
            report(outcome);
        }
    }

    Ok(())
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    }
}

async fn submit<F: Form>(pipeline: &MutationPipeline, form: &mut F) -> Result<SubmitOutcome> {
    pipeline.submit(form).await.context("submission failed")
}

fn report(outcome: SubmitOutcome) {
    match &outcome.applied {
        Applied::Patient(Some(p)) => println!("Added patient [{}] {}", p.id, patient_line(p)),
        Applied::Doctor(Some(d)) => println!("Added doctor [{}] {}", d.id, d.display_name()),
        Applied::Appointment(Some(a)) => println!("Booked [{}] {}", a.id, AppointmentSummary::of(a)),
        Applied::VisitNote(Some(n)) => {
            println!("Recorded note [{}] for appointment {}", n.id, n.appointment.id)
        }
        Applied::Deleted(id) => println!("Deleted visit note {id}"),
        Applied::Patient(None) => println!("Added patient"),
        Applied::Doctor(None) => println!("Added doctor"),
        Applied::Appointment(None) => println!("Booked appointment"),
        Applied::VisitNote(None) => println!("Recorded note"),
    }
    if let ReloadStatus::Failed(e) = &outcome.reload {
        eprintln!("warning: saved, but refreshing failed: {e}");
    }
}
