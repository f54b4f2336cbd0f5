//! In-process SQLite backend.
//!
//! [`Database`] owns the tables; [`SqliteBackend`] serves the same REST
//! surface as the HTTP API on top of it, so the store and pipeline can run
//! without a server (local mode, tests).

mod appointments;
mod patients;
mod schema;
mod visit_notes;

pub use schema::*;

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{routes, ApiError, ApiResult, Backend};
use crate::models::EntityId;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// HTTP status the REST surface would answer with.
    pub fn status(&self) -> u16 {
        match self {
            DbError::NotFound(_) => 404,
            DbError::Constraint(_) | DbError::Json(_) => 400,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                400
            }
            DbError::Sqlite(_) => 500,
        }
    }
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Turn a just-written row that cannot be read back into an error.
    fn require<T>(&self, row: Option<T>, kind: &str, id: EntityId) -> DbResult<T> {
        row.ok_or_else(|| DbError::NotFound(format!("{kind} {id}")))
    }
}

// =========================================================================
// Backend
// =========================================================================

/// [`Backend`] answering the REST routes from a local [`Database`].
///
/// The stats route mirrors the stored-procedure response shape:
/// `[rows, {"fieldCount": 0, "affectedRows": 0}]`.
#[derive(Clone)]
pub struct SqliteBackend {
    db: Arc<Mutex<Database>>,
}

impl SqliteBackend {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open or create a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Fresh in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Run `op` against the locked database, mapping failures to API errors.
    fn with_db<T, F>(&self, path: &str, op: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> DbResult<T>,
    {
        let db = self
            .db
            .lock()
            .map_err(|e| ApiError::Transport(format!("Lock poisoned: {e}")))?;
        op(&db).map_err(|e| {
            let status = e.status();
            if status >= 500 {
                warn!(path, error = %e, "local backend failure");
            }
            ApiError::Status {
                path: path.to_string(),
                status,
                body: e.to_string(),
            }
        })
    }

    fn read<T: Serialize>(&self, path: &str, op: impl FnOnce(&Database) -> DbResult<T>) -> ApiResult<Value> {
        self.with_db(path, |db| Ok(serde_json::to_value(op(db)?)?))
    }

    fn create<B, T>(&self, path: &str, body: Value, op: impl FnOnce(&Database, &B) -> DbResult<T>) -> ApiResult<Value>
    where
        B: DeserializeOwned,
        T: Serialize,
    {
        self.with_db(path, |db| {
            let request: B = serde_json::from_value(body)?;
            Ok(serde_json::to_value(op(db, &request)?)?)
        })
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn get(&self, path: &str) -> ApiResult<Value> {
        debug!(path, "local GET");
        match path {
            routes::PATIENTS => self.read(path, Database::list_patients),
            routes::DOCTORS => self.read(path, Database::list_doctors),
            routes::APPOINTMENTS => self.read(path, Database::list_appointments),
            routes::VISIT_NOTES => self.read(path, Database::list_visit_notes),
            routes::APPOINTMENT_STATS => self.with_db(path, |db| {
                let rows = db.appointment_stats()?;
                Ok(json!([rows, {"fieldCount": 0, "affectedRows": 0}]))
            }),
            _ => Err(ApiError::UnknownRoute {
                method: "GET",
                path: path.to_string(),
            }),
        }
    }

    async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        debug!(path, "local POST");
        match path {
            routes::PATIENTS => self.create(path, body, Database::insert_patient),
            routes::DOCTORS => self.create(path, body, Database::insert_doctor),
            routes::APPOINTMENTS => self.create(path, body, Database::insert_appointment),
            routes::VISIT_NOTES => self.create(path, body, Database::insert_visit_note),
            _ => Err(ApiError::UnknownRoute {
                method: "POST",
                path: path.to_string(),
            }),
        }
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        debug!(path, "local DELETE");
        match routes::parse_visit_note(path) {
            Some(id) => self.with_db(path, |db| db.delete_visit_note(id)),
            None => Err(ApiError::UnknownRoute {
                method: "DELETE",
                path: path.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in ["appointments", "doctors", "patients", "visit_notes"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[tokio::test]
    async fn test_stats_route_is_nested() {
        let backend = SqliteBackend::in_memory().unwrap();
        let body = backend.get(routes::APPOINTMENT_STATS).await.unwrap();

        let sets = body.as_array().unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0], json!([]));
        assert_eq!(sets[1]["affectedRows"], 0);
    }

    #[tokio::test]
    async fn test_post_returns_created_row() {
        let backend = SqliteBackend::in_memory().unwrap();
        let created = backend
            .post(
                routes::PATIENTS,
                json!({"name": "A", "email": "a@x.com", "birthdate": "2000-01-01"}),
            )
            .await
            .unwrap();

        assert_eq!(created["id"], 1);
        assert_eq!(created["birthdate"], "2000-01-01");
    }

    #[tokio::test]
    async fn test_bad_body_is_400() {
        let backend = SqliteBackend::in_memory().unwrap();
        let err = backend
            .post(routes::DOCTORS, json!({"name": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_is_404() {
        let backend = SqliteBackend::in_memory().unwrap();
        let err = backend.delete(&routes::visit_note(3)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unknown_routes() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(matches!(
            backend.get("/nurses").await,
            Err(ApiError::UnknownRoute { method: "GET", .. })
        ));
        assert!(matches!(
            backend.delete(routes::PATIENTS).await,
            Err(ApiError::UnknownRoute { method: "DELETE", .. })
        ));
    }
}
