//! In-memory provider implementations for tests and local development.

pub mod store;

pub use store::InMemoryBedStore;
