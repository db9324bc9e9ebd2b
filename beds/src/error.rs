//! Error types for bed inventory and booking operations.

use crate::types::{ParseEnumError, WardType};
use axum::http::StatusCode;
use pocketcare_web::AppError;
use thiserror::Error;

/// Result type alias for bed operations.
pub type Result<T> = std::result::Result<T, BedError>;

/// Failure modes of the bed service, grouped by how callers react to them.
#[derive(Debug, Error)]
pub enum BedError {
    // ═══════════════════════════════════════════════════════════
    // Caller Errors
    // ═══════════════════════════════════════════════════════════

    /// Input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Referenced resource does not exist (or is not visible to the caller).
    #[error("{resource} not found")]
    NotFound {
        /// Resource kind (`Booking`, `Hospital`, `Ward`, ...)
        resource: &'static str,
        /// Requested key
        id: i64,
    },

    /// Caller may not act on this resource.
    #[error("{0}")]
    Forbidden(String),

    // ═══════════════════════════════════════════════════════════
    // Inventory & Lifecycle Errors
    // ═══════════════════════════════════════════════════════════

    /// No bed could be reserved in the requested ward.
    #[error("No beds available for the selected ward type. Please choose a different option.")]
    CapacityExhausted {
        /// Requested ward category
        ward_type: WardType,
    },

    /// The booking's current status does not allow the operation.
    #[error("{0}")]
    InvalidState(String),

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Storage failed or returned data that does not fit the domain model.
    #[error("Storage error: {0}")]
    Store(String),
}

impl BedError {
    /// Shorthand for [`BedError::NotFound`].
    #[must_use]
    pub const fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    /// A ward still holds beds for confirmed bookings.
    #[must_use]
    pub fn ward_in_use() -> Self {
        Self::Conflict("Ward has confirmed bookings; cancel or complete them first".to_string())
    }

    /// Wrap a row value that failed to parse into a domain enum.
    #[must_use]
    pub fn corrupt_row(err: &ParseEnumError) -> Self {
        Self::Store(format!("unexpected stored value: {err}"))
    }

    /// Machine-readable code used in HTTP error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::CapacityExhausted { .. } => "CAPACITY_EXHAUSTED",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::Store(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::CapacityExhausted { .. } | Self::InvalidState(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ParseEnumError> for BedError {
    fn from(err: ParseEnumError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for BedError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Conflict(match db.constraint() {
                    Some("uq_private_rooms_hospital_room") => {
                        "A room with this number already exists".to_string()
                    }
                    Some(constraint) => format!("Duplicate value violates {constraint}"),
                    None => "Duplicate value".to_string(),
                });
            }
            if db.is_foreign_key_violation() {
                return Self::Validation(format!(
                    "Referenced record does not exist: {}",
                    db.constraint().unwrap_or("foreign key")
                ));
            }
            if db.is_check_violation() {
                return Self::Validation(format!("Value rejected by constraint: {}", db.message()));
            }
        }
        Self::Store(err.to_string())
    }
}

impl From<BedError> for AppError {
    fn from(err: BedError) -> Self {
        if matches!(err, BedError::Store(_)) {
            return Self::internal("An internal error occurred").with_source(anyhow::Error::new(err));
        }
        Self::new(err.status(), err.code(), err.to_string())
    }
}
