//! Axum integration shared by PocketCare HTTP services.
//!
//! Services built on this crate keep their handlers thin: extract and
//! validate the request, call into the domain layer, and map the outcome to
//! JSON. This crate owns the parts every service repeats:
//!
//! - [`AppError`]: the single error type handlers return, rendered as
//!   `{"error": ..., "code": ...}` with the right status code
//! - [`BearerToken`] and [`CorrelationId`] extractors
//! - [`middleware::propagate_correlation_id`] for request-scoped tracing spans
//! - liveness and readiness handlers driven by a [`ReadinessProbe`]
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware::from_fn, routing::get, Router};
//! use pocketcare_web::{handlers::health_check, middleware::propagate_correlation_id};
//!
//! let app = Router::new()
//!     .route("/health", get(health_check))
//!     .layer(from_fn(propagate_correlation_id));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use handlers::health::{ReadinessProbe, ReadinessReport};
pub use middleware::CORRELATION_ID_HEADER;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
