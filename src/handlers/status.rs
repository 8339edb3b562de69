//! Status and health check handlers for the payment relay.
//!
//! - `/health` - Simple liveness check for systemd/load balancers
//! - `/status` - Uptime plus per-endpoint counters
//!
//! # Example Response
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "name": "fedapay-relay",
//!   "uptime_seconds": 3600,
//!   "payments_initiated": 128,
//!   "callbacks_processed": 120,
//!   "webhooks_received": 260,
//!   "webhooks_rejected": 3,
//!   "status": "running",
//!   "timestamp": "2026-08-25T12:00:00Z"
//! }
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::handlers::AppState;

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Response Types
// ============================================================================

/// Health check response for simple liveness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Detailed server status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server version (from Cargo.toml)
    pub version: String,

    /// Server name
    pub name: String,

    /// Server uptime in seconds
    pub uptime_seconds: u64,

    /// Payment links successfully handed to the frontend
    pub payments_initiated: u64,

    /// Callback redirects issued
    pub callbacks_processed: u64,

    /// Webhook deliveries received, valid or not
    pub webhooks_received: u64,

    /// Webhook deliveries answered with a non-2xx
    pub webhooks_rejected: u64,

    /// Server status (always "running" if responding)
    pub status: String,

    /// ISO8601 timestamp of when status was generated
    pub timestamp: String,
}

// ============================================================================
// HTTP Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// # Route
/// `GET /health`
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// Detailed status endpoint handler.
///
/// # Route
/// `GET /status`
#[instrument(skip_all)]
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Status check requested");

    let response = StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVER_NAME.to_string(),
        uptime_seconds: state.uptime_seconds(),
        payments_initiated: state.payments_initiated(),
        callbacks_processed: state.callbacks_processed(),
        webhooks_received: state.webhooks_received(),
        webhooks_rejected: state.webhooks_rejected(),
        status: "running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(response))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;

    #[test]
    fn test_health_response_default() {
        let health = HealthResponse::default();
        assert_eq!(health.status, "healthy");
    }

    #[test]
    fn test_server_constants() {
        assert!(!SERVER_VERSION.is_empty());
        assert_eq!(SERVER_NAME, "fedapay-relay");
    }

    #[test]
    fn test_status_response_serialization() {
        let response = StatusResponse {
            version: "0.1.0".to_string(),
            name: "test-server".to_string(),
            uptime_seconds: 3600,
            payments_initiated: 128,
            callbacks_processed: 120,
            webhooks_received: 260,
            webhooks_rejected: 3,
            status: "running".to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"webhooks_rejected\":3"));
        assert!(json.contains("\"status\":\"running\""));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_handler_reports_counters() {
        let state = test_state();
        state.record_payment_initiated();
        state.record_webhook();
        state.record_webhook();

        let response = status_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: StatusResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status.payments_initiated, 1);
        assert_eq!(status.webhooks_received, 2);
        assert_eq!(status.name, SERVER_NAME);
    }
}
