//! PocketCare bed service: hospital bed inventory and bed bookings.
//!
//! Hospitals publish ward capacity and private rooms; patients book a bed,
//! which is confirmed immediately against the ward's available pool.
//!
//! - **Capacity ledger** ([`ledger`]): per-ward counters that always satisfy
//!   `total == available + occupied + reserved`
//! - **Booking lifecycle** ([`booking`]): create, cancel and status changes,
//!   each paired atomically with the ward counter it moves
//! - **Allocation log** ([`allocation_log`]): append-only audit trail of
//!   capacity-changing actions
//! - **Private rooms** ([`rooms`]) and the dashboard **summary** ([`summary`])
//!
//! # Architecture
//!
//! ```text
//! HTTP (axum)                 Domain                     Storage
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────────┐
//! │ api::*       │────▶│ BookingManager   │────▶│ providers::BedStore  │
//! │ AuthUser     │     │ ledger, rooms,   │     ├──────────────────────┤
//! │ AuthHospital │     │ allocation_log   │     │ PostgresBedStore     │
//! └──────────────┘     └──────────────────┘     │ InMemoryBedStore     │
//!                                               └──────────────────────┘
//! ```
//!
//! A booking's capacity decrement and its row insert commit together; a
//! release and the status change that causes it commit together. Two
//! concurrent bookings for the last bed cannot both succeed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod allocation_log;
pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod error;
pub mod input;
pub mod ledger;
pub mod metrics;
pub mod providers;
pub mod rooms;
pub mod server;
pub mod stores;
pub mod summary;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use auth::{Identity, TokenKeys};
pub use booking::{BookingConfirmation, BookingManager, CreateBookingRequest};
pub use config::Config;
pub use error::{BedError, Result};
pub use ledger::{BedCounts, WardLookup};
pub use providers::BedStore;
pub use server::{build_router, AppState};
pub use stores::PostgresBedStore;
pub use types::*;
