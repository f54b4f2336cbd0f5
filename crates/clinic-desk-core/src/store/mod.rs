//! In-memory mirror of the backend collections.
//!
//! One [`EntityStore`] is the single source of truth for every view. Loads fan
//! out one request per collection, join them, and install a new [`Snapshot`]
//! in one step:
//!
//! ```text
//! load(collections) ──► generation = next()
//!        │
//!        ├── GET /patients ─┐
//!        ├── GET /doctors ──┤  try_join (first failure aborts the rest)
//!        ├── ...           ─┘
//!        │
//!        ▼
//!  merge each collection whose last install is older than generation
//!        │
//!        ▼
//!  watch channel ──► subscribers
//! ```
//!
//! A failed load installs nothing. Generations are tracked per collection: a
//! load that finishes late still fills the collections no newer load has
//! touched, and is discarded only when every collection it fetched has
//! already been replaced by a newer load.

mod scope;
mod snapshot;

pub use scope::*;
pub use snapshot::*;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ClinicApi};

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to fetch {collection}: {source}")]
    Fetch {
        collection: Collection,
        #[source]
        source: ApiError,
    },

    #[error("Load cancelled: view closed")]
    Cancelled,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What happened to a load that fetched successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// At least one fetched collection is now in the current snapshot.
    Installed { generation: u64 },
    /// Newer loads already replaced every fetched collection; nothing changed.
    Superseded { generation: u64, current: u64 },
}

impl LoadOutcome {
    pub fn is_installed(&self) -> bool {
        matches!(self, LoadOutcome::Installed { .. })
    }
}

/// Freshly fetched collections; `None` means "not requested, keep current".
#[derive(Default)]
struct Fetched {
    patients: Option<Vec<crate::models::Patient>>,
    doctors: Option<Vec<crate::models::Doctor>>,
    appointments: Option<Vec<crate::models::Appointment>>,
    visit_notes: Option<Vec<crate::models::VisitNote>>,
    stats: Option<Vec<crate::models::Stat>>,
}

impl Fetched {
    fn collections(&self) -> BTreeSet<Collection> {
        [
            (Collection::Patients, self.patients.is_some()),
            (Collection::Doctors, self.doctors.is_some()),
            (Collection::Appointments, self.appointments.is_some()),
            (Collection::VisitNotes, self.visit_notes.is_some()),
            (Collection::Stats, self.stats.is_some()),
        ]
        .into_iter()
        .filter_map(|(collection, present)| present.then_some(collection))
        .collect()
    }
}

/// Holds the current snapshot and reloads it from the backend.
pub struct EntityStore {
    api: ClinicApi,
    last_generation: AtomicU64,
    current: watch::Sender<Arc<Snapshot>>,
}

impl EntityStore {
    /// Create a store with an empty, unloaded snapshot.
    pub fn new(api: ClinicApi) -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::empty()));
        Self {
            api,
            last_generation: AtomicU64::new(0),
            current,
        }
    }

    /// The API the store loads from.
    pub fn api(&self) -> &ClinicApi {
        &self.api
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Receiver notified whenever a new snapshot is installed.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }

    /// Reload every collection.
    pub async fn load_all(&self) -> StoreResult<LoadOutcome> {
        self.load(&Collection::ALL).await
    }

    /// Reload the given collections in full, keeping the others as they are.
    pub async fn load(&self, collections: &[Collection]) -> StoreResult<LoadOutcome> {
        let wanted: BTreeSet<Collection> = collections.iter().copied().collect();
        let generation = self.last_generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, collections = ?wanted, "starting load");

        let fetched = match self.fetch(&wanted).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(generation, error = %e, "load failed, keeping previous snapshot");
                return Err(e);
            }
        };

        Ok(self.install(generation, fetched))
    }

    /// Like [`EntityStore::load`], but abandoned without installing anything
    /// if `scope` closes first.
    pub async fn load_scoped(
        &self,
        collections: &[Collection],
        scope: &ViewScope,
    ) -> StoreResult<LoadOutcome> {
        if scope.is_closed() {
            return Err(StoreError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = scope.closed() => {
                debug!("view closed, dropping in-flight load");
                Err(StoreError::Cancelled)
            }
            outcome = self.load(collections) => outcome,
        }
    }

    async fn fetch(&self, wanted: &BTreeSet<Collection>) -> StoreResult<Fetched> {
        let api = &self.api;
        let (patients, doctors, appointments, visit_notes, stats) = tokio::try_join!(
            fetch_if(wanted, Collection::Patients, api.list_patients()),
            fetch_if(wanted, Collection::Doctors, api.list_doctors()),
            fetch_if(wanted, Collection::Appointments, api.list_appointments()),
            fetch_if(wanted, Collection::VisitNotes, api.list_visit_notes()),
            fetch_if(wanted, Collection::Stats, api.appointment_stats()),
        )?;
        Ok(Fetched {
            patients,
            doctors,
            appointments,
            visit_notes,
            stats,
        })
    }

    fn install(&self, generation: u64, fetched: Fetched) -> LoadOutcome {
        let mut outcome = LoadOutcome::Installed { generation };
        let requested = fetched.collections();
        let mut kept = BTreeSet::new();

        // Compare and replace under the channel lock so concurrent loads
        // cannot interleave between the check and the write.
        self.current.send_if_modified(|current| {
            let fresh: BTreeSet<Collection> = requested
                .iter()
                .copied()
                .filter(|c| current.generation_of(*c) < generation)
                .collect();
            if fresh.is_empty() && (!requested.is_empty() || current.generation >= generation) {
                outcome = LoadOutcome::Superseded {
                    generation,
                    current: current.generation,
                };
                return false;
            }
            kept = requested.difference(&fresh).copied().collect();

            let mut generations = current.collection_generations().clone();
            for collection in &fresh {
                generations.insert(*collection, generation);
            }
            let Fetched {
                patients,
                doctors,
                appointments,
                visit_notes,
                stats,
            } = fetched;
            let next = Snapshot::assemble(
                generation.max(current.generation),
                Some(Utc::now()),
                merge(&fresh, Collection::Patients, patients, &current.patients),
                merge(&fresh, Collection::Doctors, doctors, &current.doctors),
                merge(&fresh, Collection::Appointments, appointments, &current.appointments),
                merge(&fresh, Collection::VisitNotes, visit_notes, &current.visit_notes),
                merge(&fresh, Collection::Stats, stats, &current.stats),
            )
            .with_collection_generations(generations);
            *current = Arc::new(next);
            true
        });

        match outcome {
            LoadOutcome::Installed { generation } if kept.is_empty() => {
                info!(generation, "installed snapshot");
            }
            LoadOutcome::Installed { generation } => {
                info!(generation, kept_newer = ?kept, "installed snapshot, newer collections kept");
            }
            LoadOutcome::Superseded { generation, current } => {
                debug!(generation, current, "discarding superseded load");
            }
        }
        outcome
    }
}

/// The fetched rows if this load may replace `collection`, else the current ones.
fn merge<T: Clone>(
    fresh: &BTreeSet<Collection>,
    collection: Collection,
    fetched: Option<Vec<T>>,
    current: &[T],
) -> Vec<T> {
    match fetched {
        Some(rows) if fresh.contains(&collection) => rows,
        _ => current.to_vec(),
    }
}

async fn fetch_if<T, F>(
    wanted: &BTreeSet<Collection>,
    collection: Collection,
    request: F,
) -> StoreResult<Option<T>>
where
    F: Future<Output = Result<T, ApiError>>,
{
    if !wanted.contains(&collection) {
        return Ok(None);
    }
    request
        .await
        .map(Some)
        .map_err(|source| StoreError::Fetch { collection, source })
}
