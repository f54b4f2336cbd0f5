//! Backend seam and typed access to the scheduling REST surface.
//!
//! [`Backend`] speaks raw JSON over paths; [`ClinicApi`] layers the route
//! table and the typed request/response shapes on top of it.

mod client;
mod requests;
pub mod routes;

pub use client::*;
pub use requests::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from backend calls.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend returned {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Unknown route: {method} {path}")]
    UnknownRoute { method: &'static str, path: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build a decode error for a response body that did not match its schema.
    pub fn decode(path: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Decode {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether the backend answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// A JSON backend reachable by path.
///
/// Implementations: the HTTP client in `clinic-desk-http` and the in-process
/// [`crate::db::SqliteBackend`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET path`, returning the decoded JSON body.
    async fn get(&self, path: &str) -> ApiResult<Value>;

    /// `POST path` with a JSON body, returning the decoded JSON body.
    async fn post(&self, path: &str, body: Value) -> ApiResult<Value>;

    /// `DELETE path`. The response body, if any, is ignored.
    async fn delete(&self, path: &str) -> ApiResult<()>;
}
