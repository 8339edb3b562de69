//! Webhook Receiver
//!
//! `POST /fedapay-webhook` is the authoritative payment signal. The handler
//! works on the raw body bytes because the signature covers exactly what
//! FedaPay sent; any parsing before verification would be a bug.
//!
//! Responses follow the provider's retry contract:
//!
//! - signature or decode failure: `400 Webhook Error: <reason>`, FedaPay
//!   keeps the delivery and retries
//! - handled, ignored, duplicate, or failed under the default ack policy:
//!   `200 {"received": true}`
//! - handler failure with the redelivery policy: `500`, FedaPay retries
//!
//! Each delivery gets a generated `delivery_id` span field so retries of the
//! same event can be told apart in the logs.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::error::Error;
use crate::fedapay::SIGNATURE_HEADER;
use crate::handlers::AppState;

/// Acknowledgment body FedaPay receives on 2xx
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    /// Always `true`; the ack carries no other information
    pub received: bool,
}

impl Default for WebhookAck {
    fn default() -> Self {
        Self { received: true }
    }
}

/// `POST /fedapay-webhook`
#[instrument(skip_all, fields(delivery_id = %uuid::Uuid::new_v4(), event_name = tracing::field::Empty))]
pub async fn fedapay_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record_webhook();

    let header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let event = match state.verifier().construct_event(&body, header) {
        Ok(event) => event,
        Err(e) => {
            state.record_webhook_rejected();
            warn!(error = %e, "Rejecting webhook delivery");
            return (StatusCode::BAD_REQUEST, format!("Webhook Error: {e}")).into_response();
        }
    };
    tracing::Span::current().record("event_name", event.name.as_str());

    match state.dispatcher().dispatch(&event).await {
        Ok(outcome) => {
            debug!(outcome = ?outcome, "Webhook delivery acknowledged");
            (StatusCode::OK, Json(WebhookAck::default())).into_response()
        }
        Err(e) => {
            state.record_webhook_rejected();
            let status = e.status_code();
            let body = match &e {
                Error::Decode(_) | Error::Signature(_) => format!("Webhook Error: {e}"),
                _ => e.to_string(),
            };
            error!(error = %e, status = %status, "Webhook delivery not acknowledged");
            (status, body).into_response()
        }
    }
}
