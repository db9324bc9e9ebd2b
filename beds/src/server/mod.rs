//! HTTP server module for the bed service.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Liveness and readiness endpoints
//! - Router configuration

pub mod health;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
