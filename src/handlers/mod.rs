//! HTTP Handlers for the Payment Relay
//!
//! The relay exposes three payment endpoints plus monitoring:
//!
//! | Route               | Method | Purpose                                      |
//! |---------------------|--------|----------------------------------------------|
//! | `/create-payment`   | POST   | Validate input, create transaction, return the hosted checkout URL |
//! | `/payment-callback` | GET    | Re-fetch the transaction and redirect the customer by its real status |
//! | `/fedapay-webhook`  | POST   | Verify, decode, and dispatch webhook events  |
//! | `/health`           | GET    | Liveness probe                               |
//! | `/status`           | GET    | Uptime and per-endpoint counters             |
//!
//! All handlers share one [`AppState`] built at startup; nothing mutable is
//! global and nothing configuration-derived changes after boot.

pub mod callback;
pub mod payments;
pub mod status;
pub mod webhook;

pub use callback::{payment_callback, CallbackParams};
pub use payments::{create_payment, CreatePaymentRequest, PaymentUrlResponse};
pub use status::{health_handler, status_handler, HealthResponse, StatusResponse};
pub use webhook::{fedapay_webhook, WebhookAck};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, RedirectTargets};
use crate::error::Result;
use crate::fedapay::{EventDispatcher, FedapayClient, SignatureVerifier};

/// Shared application state
///
/// Holds the provider client, the webhook verifier, the event dispatcher and
/// the redirect targets, all immutable after construction, plus the counters
/// the `/status` endpoint reports.
pub struct AppState {
    /// Server start time for uptime calculation
    start_time: Instant,

    /// FedaPay REST client
    client: FedapayClient,

    /// Webhook signature verifier
    verifier: SignatureVerifier,

    /// Routes verified events to the business handler
    dispatcher: EventDispatcher,

    /// Frontend URLs the callback handler redirects to
    redirects: RedirectTargets,

    /// Currency applied to created transactions
    currency_iso: String,

    /// Payment links successfully handed to the frontend
    payments_initiated: AtomicU64,

    /// Callback redirects issued
    callbacks_processed: AtomicU64,

    /// Webhook deliveries received, valid or not
    webhooks_received: AtomicU64,

    /// Webhook deliveries answered with a non-2xx
    webhooks_rejected: AtomicU64,
}

impl AppState {
    /// Build the state from configuration and a dispatcher
    pub fn new(config: &AppConfig, dispatcher: EventDispatcher) -> Result<Self> {
        Ok(Self {
            start_time: Instant::now(),
            client: FedapayClient::new(&config.provider)?,
            verifier: SignatureVerifier::new(config.webhook.endpoint_secret.clone())
                .with_tolerance(config.webhook.tolerance),
            dispatcher,
            redirects: config.redirects.clone(),
            currency_iso: config.provider.currency_iso.clone(),
            payments_initiated: AtomicU64::new(0),
            callbacks_processed: AtomicU64::new(0),
            webhooks_received: AtomicU64::new(0),
            webhooks_rejected: AtomicU64::new(0),
        })
    }

    /// Provider API client
    #[inline]
    pub fn client(&self) -> &FedapayClient {
        &self.client
    }

    /// Webhook signature verifier
    #[inline]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    /// Event dispatcher
    #[inline]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Configured redirect targets
    #[inline]
    pub fn redirects(&self) -> &RedirectTargets {
        &self.redirects
    }

    /// Currency applied to created transactions
    #[inline]
    pub fn currency_iso(&self) -> &str {
        &self.currency_iso
    }

    /// Get the server uptime in seconds
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get the number of payment links handed out
    #[inline]
    pub fn payments_initiated(&self) -> u64 {
        self.payments_initiated.load(Ordering::Relaxed)
    }

    /// Increment the payment counter and return the new value
    #[inline]
    pub fn record_payment_initiated(&self) -> u64 {
        self.payments_initiated.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the number of callback redirects issued
    #[inline]
    pub fn callbacks_processed(&self) -> u64 {
        self.callbacks_processed.load(Ordering::Relaxed)
    }

    /// Increment the callback counter and return the new value
    #[inline]
    pub fn record_callback(&self) -> u64 {
        self.callbacks_processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the number of webhook deliveries received
    #[inline]
    pub fn webhooks_received(&self) -> u64 {
        self.webhooks_received.load(Ordering::Relaxed)
    }

    /// Increment the webhook counter and return the new value
    #[inline]
    pub fn record_webhook(&self) -> u64 {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get the number of webhook deliveries answered non-2xx
    #[inline]
    pub fn webhooks_rejected(&self) -> u64 {
        self.webhooks_rejected.load(Ordering::Relaxed)
    }

    /// Increment the rejected-webhook counter and return the new value
    #[inline]
    pub fn record_webhook_rejected(&self) -> u64 {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Build the complete application router
///
/// CORS only matters for `/create-payment` (the one browser-XHR surface) but
/// the layer is applied once at the top; it is a no-op for requests without
/// an `Origin` header.
pub fn app_router(state: Arc<AppState>, allowed_origins: &[String]) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/create-payment", post(payments::create_payment))
        .route("/payment-callback", get(callback::payment_callback))
        .route("/fedapay-webhook", post(webhook::fedapay_webhook))
        .route("/health", get(status::health_handler))
        .route("/status", get(status::status_handler))
        .layer(crate::cors::cors_layer(allowed_origins))
        .with_state(state)
}
