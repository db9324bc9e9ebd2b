//! Application state for the bed service HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Bed store (wards, rooms, bookings, allocation log)
//! - Booking manager (lifecycle and capacity bookkeeping)
//! - Token keys (bearer token verification)

use crate::auth::TokenKeys;
use crate::booking::BookingManager;
use crate::providers::BedStore;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply via `Arc`) for each request.
pub struct AppState<S> {
    /// Bed store for direct inventory queries and CRUD
    pub store: Arc<S>,

    /// Booking lifecycle manager over the same store
    pub bookings: BookingManager<S>,

    /// Keys for verifying bearer tokens
    pub tokens: Arc<TokenKeys>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bookings: self.bookings.clone(),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<S: BedStore> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// - `store`: Bed store shared by handlers and the booking manager
    /// - `tokens`: Keys for bearer token verification
    #[must_use]
    pub fn new(store: Arc<S>, tokens: TokenKeys) -> Self {
        Self {
            bookings: BookingManager::new(Arc::clone(&store)),
            store,
            tokens: Arc::new(tokens),
        }
    }
}

// Lets the auth extractors pull token keys out of the state
impl<S> FromRef<AppState<S>> for Arc<TokenKeys> {
    fn from_ref(app_state: &AppState<S>) -> Self {
        Arc::clone(&app_state.tokens)
    }
}
