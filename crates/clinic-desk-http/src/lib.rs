//! HTTP transport and configuration for the clinic desk client.
//!
//! [`HttpBackend`] implements the core [`Backend`](clinic_desk_core::Backend)
//! seam with `reqwest`; [`ClientConfig`] reads where the backend lives from
//! the environment.

pub mod config;
pub mod http;

pub use config::*;
pub use http::*;
