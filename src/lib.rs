//! FedaPay Relay - Payment Backend Between a Checkout Frontend and FedaPay
//!
//! This crate provides a small, production-ready payment relay: the frontend
//! asks it for hosted checkout links, customers bounce through it after
//! paying, and FedaPay pushes authoritative payment events into it.
//!
//! # Features
//!
//! - **Payment Initiation**: validated checkout requests exchanged for hosted
//!   payment-page links
//! - **Redirect Reconciliation**: transaction status re-fetched from the API
//!   before the customer's browser is redirected; URL hints are never trusted
//! - **Webhook Verification**: constant-time HMAC-SHA256 over the raw
//!   delivery bytes, with timestamp tolerance
//! - **Event Dispatch**: typed transaction events routed to pluggable
//!   business handlers, with optional delivery deduplication
//!
//! # Architecture
//!
//! ```text
//! Frontend ──▶ POST /create-payment ──▶ FedaPay API (transaction + token)
//!                                              │
//!          ◀────────── {"paymentUrl"} ◀────────┘
//!
//! Customer ──▶ GET /payment-callback ──▶ retrieve transaction ──▶ 303 redirect
//!                                         (authoritative status)
//!
//! FedaPay ──▶ POST /fedapay-webhook ──▶ verify ──▶ decode ──▶ dispatch ──▶ 200
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fedapay_relay::config::AppConfig;
//! use fedapay_relay::fedapay::{EventDispatcher, LoggingHandler};
//! use fedapay_relay::handlers::{app_router, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let dispatcher = EventDispatcher::new(Arc::new(LoggingHandler));
//!     let state = Arc::new(AppState::new(&config, dispatcher)?);
//!
//!     let app = app_router(state, &config.server.allowed_origins);
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.server.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod cors;
pub mod error;
pub mod fedapay;
pub mod handlers;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::{Error, Result};
pub use fedapay::{EventDispatcher, FedapayClient, SignatureVerifier, TransactionHandler};
pub use handlers::{app_router, AppState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
