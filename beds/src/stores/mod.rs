//! Storage implementations for the bed service.
//!
//! - **PostgreSQL** - Wards, private rooms, bookings and the allocation log

pub mod postgres;

pub use postgres::PostgresBedStore;
