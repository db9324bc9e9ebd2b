//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Simple health check endpoint (for basic liveness).
///
/// Returns 200 OK to indicate the service is running.
/// This endpoint does NOT check dependencies (database, etc.).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// A dependency whose availability decides readiness.
pub trait ReadinessProbe: Send + Sync + 'static {
    /// Component name reported in the readiness body.
    fn component(&self) -> &'static str;

    /// Check the dependency.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the dependency is unavailable.
    fn probe(&self) -> impl Future<Output = Result<(), String>> + Send;
}

/// Readiness probe outcome.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReadinessReport {
    /// Component that was probed.
    pub component: &'static str,
    /// `"ready"` or `"unavailable"`.
    pub status: &'static str,
    /// Failure reason, when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Readiness endpoint backed by a [`ReadinessProbe`].
///
/// # Status Codes
///
/// - 200 OK: the probe succeeded
/// - 503 Service Unavailable: the probe failed
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness_check<P: ReadinessProbe>(
    State(probe): State<Arc<P>>,
) -> (StatusCode, Json<ReadinessReport>) {
    match probe.probe().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessReport {
                component: probe.component(),
                status: "ready",
                message: None,
            }),
        ),
        Err(reason) => {
            tracing::warn!(component = probe.component(), %reason, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessReport {
                    component: probe.component(),
                    status: "unavailable",
                    message: Some(reason),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(Result<(), String>);

    impl ReadinessProbe for FixedProbe {
        fn component(&self) -> &'static str {
            "database"
        }

        async fn probe(&self) -> Result<(), String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_when_probe_succeeds() {
        let probe = Arc::new(FixedProbe(Ok(())));

        let (status, Json(report)) = readiness_check(State(probe)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");
        assert_eq!(report.message, None);
    }

    #[tokio::test]
    async fn test_readiness_when_probe_fails() {
        let probe = Arc::new(FixedProbe(Err("pool timed out".to_string())));

        let (status, Json(report)) = readiness_check(State(probe)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.component, "database");
        assert_eq!(report.message.as_deref(), Some("pool timed out"));
    }
}
