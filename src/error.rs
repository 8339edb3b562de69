//! Error types for the FedaPay relay
//!
//! This module provides the error type hierarchy using `thiserror`, split along
//! the failure domains of the relay: client input, the FedaPay remote API,
//! webhook authenticity, and webhook payload decoding.

use http::StatusCode;
use thiserror::Error;

/// The main error type for relay operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or incomplete client input
    #[error("{0}")]
    Validation(String),

    /// FedaPay API failure of any kind (network, auth, 4xx/5xx)
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Webhook authenticity failure
    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// Malformed webhook payload after successful verification
    #[error("unable to decode webhook payload: {0}")]
    Decode(String),

    /// Webhook business-logic failure surfaced for redelivery
    ///
    /// Only produced when a handler opts into redelivery; the default policy
    /// logs handler failures and keeps the 2xx acknowledgment.
    #[error("event handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    /// Startup configuration problem (missing or unparseable settings)
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures talking to the FedaPay API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network-level failure, including timeouts
    #[error("request to FedaPay failed: {0}")]
    Transport(String),

    /// FedaPay answered with a non-success status
    #[error("FedaPay returned {status}: {message}")]
    Api {
        /// HTTP status code from the provider
        status: u16,
        /// Message extracted from the provider error body
        message: String,
    },

    /// FedaPay answered 2xx but the body did not have the expected shape
    #[error("unexpected FedaPay response: {0}")]
    InvalidResponse(String),
}

/// Webhook signature verification failures
///
/// Variants mirror the verification stages: header presence, header parsing,
/// scheme extraction, comparison, and timestamp freshness.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature header was not sent at all
    #[error("missing x-fedapay-signature header")]
    MissingHeader,

    /// Timestamp and signatures could not be extracted from the header
    #[error("unable to extract timestamp and signatures from header")]
    Malformed,

    /// The header parsed but carried no signature entries
    #[error("no signatures found with the expected scheme")]
    NoSignature,

    /// No signature entry matched the expected signature for the payload
    #[error("no signatures found matching the expected signature for payload")]
    Mismatch,

    /// The signed timestamp is older than the configured tolerance
    #[error("timestamp outside the tolerance zone ({age_secs}s old)")]
    Expired {
        /// Age of the signed timestamp in seconds
        age_secs: i64,
    },
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error from a string
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a decode error from a string
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Error::Decode(msg.into())
    }

    /// Create a configuration error from a string
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// The HTTP status this error maps to at the transport boundary
    ///
    /// Client-side failures (validation, signature, decode) are 400; provider
    /// and internal failures are 500. Response body shaping is route-specific
    /// and lives in the handlers.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Signature(_) | Error::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Provider(_) | Error::Handler(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
