//! Immutable snapshot of the backend collections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::models::{Appointment, Doctor, EntityId, Patient, Stat, VisitNote};

/// A backend collection mirrored by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Patients,
    Doctors,
    Appointments,
    VisitNotes,
    Stats,
}

impl Collection {
    /// Every mirrored collection, in fetch order.
    pub const ALL: [Collection; 5] = [
        Collection::Patients,
        Collection::Doctors,
        Collection::Appointments,
        Collection::VisitNotes,
        Collection::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Doctors => "doctors",
            Self::Appointments => "appointments",
            Self::VisitNotes => "visit_notes",
            Self::Stats => "stats",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collections as of one successful load.
///
/// Snapshots are never mutated after installation; readers hold them behind
/// an `Arc` and a reload produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Newest load generation merged into this snapshot (0 = never loaded)
    pub generation: u64,
    /// When the load completed
    pub loaded_at: Option<DateTime<Utc>>,
    pub patients: Vec<Patient>,
    pub doctors: Vec<Doctor>,
    pub appointments: Vec<Appointment>,
    pub visit_notes: Vec<VisitNote>,
    pub stats: Vec<Stat>,
    collection_generations: BTreeMap<Collection, u64>,
    digest: String,
}

#[derive(Serialize)]
struct ContentRef<'a> {
    patients: &'a [Patient],
    doctors: &'a [Doctor],
    appointments: &'a [Appointment],
    visit_notes: &'a [VisitNote],
    stats: &'a [Stat],
}

impl Snapshot {
    /// The state before the first load.
    pub fn empty() -> Self {
        Self::assemble(0, None, Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub(crate) fn assemble(
        generation: u64,
        loaded_at: Option<DateTime<Utc>>,
        patients: Vec<Patient>,
        doctors: Vec<Doctor>,
        appointments: Vec<Appointment>,
        visit_notes: Vec<VisitNote>,
        stats: Vec<Stat>,
    ) -> Self {
        let digest = content_digest(&ContentRef {
            patients: &patients,
            doctors: &doctors,
            appointments: &appointments,
            visit_notes: &visit_notes,
            stats: &stats,
        });
        Self {
            generation,
            loaded_at,
            patients,
            doctors,
            appointments,
            visit_notes,
            stats,
            collection_generations: BTreeMap::new(),
            digest,
        }
    }

    pub(crate) fn with_collection_generations(
        mut self,
        generations: BTreeMap<Collection, u64>,
    ) -> Self {
        self.collection_generations = generations;
        self
    }

    /// Generation of the load that last replaced `collection` (0 = never).
    pub fn generation_of(&self, collection: Collection) -> u64 {
        self.collection_generations
            .get(&collection)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn collection_generations(&self) -> &BTreeMap<Collection, u64> {
        &self.collection_generations
    }

    /// Whether any load has succeeded yet.
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    /// SHA-256 over the collection contents (hex).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Whether two snapshots hold identical collections, regardless of generation.
    pub fn same_content(&self, other: &Snapshot) -> bool {
        self.digest == other.digest
    }

    /// Number of records in a collection.
    pub fn len_of(&self, collection: Collection) -> usize {
        match collection {
            Collection::Patients => self.patients.len(),
            Collection::Doctors => self.doctors.len(),
            Collection::Appointments => self.appointments.len(),
            Collection::VisitNotes => self.visit_notes.len(),
            Collection::Stats => self.stats.len(),
        }
    }

    pub fn patient(&self, id: EntityId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn doctor(&self, id: EntityId) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn appointment(&self, id: EntityId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn visit_note(&self, id: EntityId) -> Option<&VisitNote> {
        self.visit_notes.iter().find(|n| n.id == id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

fn content_digest(content: &ContentRef<'_>) -> String {
    let mut hasher = Sha256::new();
    // Plain data structs; serialization cannot fail.
    hasher.update(serde_json::to_vec(content).unwrap_or_default());
    hex::encode(hasher.finalize())
}
