//! HTTP API handlers.
//!
//! Every handler is generic over the [`BedStore`](crate::providers::BedStore)
//! so the same router serves PostgreSQL in production and the in-memory
//! store in tests.

pub mod allocation_logs;
pub mod hospital_bookings;
pub mod private_rooms;
pub mod summary;
pub mod user_bookings;
pub mod wards;

use crate::input;
use crate::types::HospitalId;
use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use pocketcare_web::AppError;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// JSON request body. Malformed bodies are rejected with a 400 `AppError`.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::bad_request("Request body must be JSON")
        }
        other => AppError::bad_request(format!("Invalid request body: {}", other.body_text())),
    }
}

/// Query string parameters. Malformed values are rejected with a 400
/// `AppError`.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| {
                AppError::bad_request(format!("Invalid query parameters: {}", rejection.body_text()))
            })
    }
}

/// `?hospital_id=` query parameter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalQuery {
    /// Hospital.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
}

impl HospitalQuery {
    /// The hospital, which must be present.
    ///
    /// # Errors
    ///
    /// Returns 400 when `hospital_id` is absent.
    pub fn require(&self) -> Result<HospitalId, AppError> {
        require_hospital_id(self.hospital_id)
    }
}

pub(crate) fn require_hospital_id(hospital_id: Option<i64>) -> Result<HospitalId, AppError> {
    hospital_id
        .map(HospitalId)
        .ok_or_else(|| AppError::bad_request("Hospital ID is required"))
}

/// Reject a hospital account acting on another hospital's records.
pub(crate) fn ensure_owner(caller: HospitalId, owner: HospitalId) -> Result<(), AppError> {
    if caller == owner {
        Ok(())
    } else {
        tracing::warn!(%caller, %owner, "Hospital attempted to act on another hospital's records");
        Err(AppError::forbidden("Access denied"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_owner_check() {
        assert!(ensure_owner(HospitalId(1), HospitalId(1)).is_ok());
        let err = ensure_owner(HospitalId(1), HospitalId(2)).unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_hospital_query_requires_id() {
        let err = HospitalQuery::default().require().unwrap_err();
        assert_eq!(err.message(), "Hospital ID is required");
        assert_eq!(HospitalQuery { hospital_id: Some(3) }.require().unwrap(), HospitalId(3));
    }
}
