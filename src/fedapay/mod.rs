//! FedaPay Integration Module
//!
//! Everything that talks to or hears from FedaPay lives here:
//!
//! - **API Client**: transaction creation, payment-token generation, and
//!   authoritative status lookups over the REST API
//! - **Signature Verification**: HMAC-SHA256 validation of the
//!   `x-fedapay-signature` header with constant-time comparison
//! - **Typed Events**: decoding of webhook payloads into transaction objects
//! - **Dispatch**: routing verified events to business handlers, with
//!   optional delivery deduplication
//!
//! # Architecture
//!
//! ```text
//! Request -> Signature Verify -> Decode Event -> Idempotency Check -> Handler -> Ack (200)
//!                  |                   |                  |              |
//!                  v                   v                  v              v
//!                 400                 400           200 (duplicate)  logged, still 200
//! ```
//!
//! # Security
//!
//! - Webhook secret and API key loaded from environment, never logged
//! - Constant-time signature comparison to prevent timing attacks
//! - Raw body verification so re-serialization cannot break signatures
//! - Redirect decisions always come from a fresh API lookup, never from
//!   query parameters the customer's browser carried
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fedapay_relay::fedapay::{EventDispatcher, LoggingHandler, SignatureVerifier};
//! use secrecy::SecretString;
//!
//! # async fn handle(raw_body: &[u8], signature_header: Option<&str>) -> anyhow::Result<()> {
//! let verifier = SignatureVerifier::new(SecretString::from("wh_sandbox_secret"));
//! let dispatcher = EventDispatcher::new(Arc::new(LoggingHandler));
//!
//! // In the webhook route, with the raw request bytes and header value:
//! let event = verifier.construct_event(raw_body, signature_header)?;
//! dispatcher.dispatch(&event).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod dispatch;
pub mod events;
pub mod idempotency;
pub mod signature;
pub mod types;

// Re-export commonly used items
pub use client::FedapayClient;
pub use dispatch::{
    DispatchOutcome, EventDispatcher, LoggingHandler, NoOpHandler, TransactionHandler,
};
pub use events::{EventData, WebhookEvent, WebhookEventKind};
pub use idempotency::{IdempotencyStore, InMemoryIdempotencyStore};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
pub use types::{
    CreateTransactionRequest, CurrencyIso, CustomerParams, PaymentOutcome, PaymentToken,
    Transaction, TransactionStatus,
};
