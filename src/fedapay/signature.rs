//! Webhook Signature Verification
//!
//! FedaPay signs webhook deliveries with an `x-fedapay-signature` header of
//! comma-separated items:
//!
//! ```text
//! t=1679999999,s=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd
//! ```
//!
//! where each `s` entry is a lowercase hex HMAC-SHA256 over the string
//! `"{t}." + raw_body`, keyed on the shared endpoint secret. Verification
//! therefore has to run against the exact request bytes; parsing the body
//! first and re-serializing it would invalidate every signature.
//!
//! # Security
//!
//! - Comparison goes through [`Mac::verify_slice`], which is constant-time.
//! - Signature entries that are not valid hex are compared against a zeroed
//!   buffer so the work done does not depend on the input.
//! - Timestamps older than the tolerance are rejected to blunt replay of
//!   captured deliveries.

use std::time::Duration;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::config::DEFAULT_WEBHOOK_TOLERANCE_SECS;
use crate::error::{Result, SignatureError};
use crate::fedapay::events::WebhookEvent;

/// Header FedaPay delivers the signature in
pub const SIGNATURE_HEADER: &str = "x-fedapay-signature";

/// Scheme tag of the signature entries in the header
const SIGNATURE_SCHEME: &str = "s";

type HmacSha256 = Hmac<Sha256>;

/// Verifies webhook signatures against a shared endpoint secret
///
/// One verifier is built at startup from [`WebhookConfig`] and shared across
/// requests; it holds no per-request state.
///
/// [`WebhookConfig`]: crate::config::WebhookConfig
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl SignatureVerifier {
    /// Create a verifier with the default timestamp tolerance
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance: Duration::from_secs(DEFAULT_WEBHOOK_TOLERANCE_SECS),
        }
    }

    /// Override the timestamp tolerance
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify the signature header against the raw request body
    pub fn verify(&self, payload: &[u8], header: &str) -> std::result::Result<(), SignatureError> {
        self.verify_at(payload, header, chrono::Utc::now().timestamp())
    }

    /// Verify, then decode the payload into a typed event
    ///
    /// This is the only path the HTTP layer uses to obtain a
    /// [`WebhookEvent`], so a payload that fails verification is never
    /// represented as an event. `None` for the header maps to
    /// [`SignatureError::MissingHeader`].
    pub fn construct_event(&self, payload: &[u8], header: Option<&str>) -> Result<WebhookEvent> {
        let header = header.ok_or(SignatureError::MissingHeader)?;
        self.verify(payload, header)?;
        WebhookEvent::from_bytes(payload)
    }

    /// Build a complete signature header for `payload` at `timestamp`
    ///
    /// Counterpart of [`verify`](Self::verify); used by tests and by tools
    /// that simulate FedaPay deliveries against a local endpoint.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let mut mac = self.keyed_mac(timestamp);
        mac.update(payload);
        format!(
            "t={timestamp},{SIGNATURE_SCHEME}={}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> std::result::Result<(), SignatureError> {
        let parsed = ParsedHeader::parse(header)?;
        if parsed.signatures.is_empty() {
            return Err(SignatureError::NoSignature);
        }

        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| self.signature_matches(payload, parsed.timestamp, candidate));
        if !matched {
            return Err(SignatureError::Mismatch);
        }

        let age_secs = now - parsed.timestamp;
        if age_secs > self.tolerance.as_secs() as i64 {
            return Err(SignatureError::Expired { age_secs });
        }

        Ok(())
    }

    fn signature_matches(&self, payload: &[u8], timestamp: i64, candidate: &str) -> bool {
        let mut mac = self.keyed_mac(timestamp);
        mac.update(payload);

        // Decode hex first - if invalid, compare against zeros to keep the
        // comparison constant-time.
        let candidate = hex::decode(candidate).unwrap_or_else(|_| vec![0u8; 32]);
        mac.verify_slice(&candidate).is_ok()
    }

    fn keyed_mac(&self, timestamp: i64) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac
    }
}

/// Timestamp and signature entries extracted from the header
struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl ParsedHeader {
    /// Split `t=...,s=...` items, ignoring schemes we don't know
    fn parse(header: &str) -> std::result::Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for item in header.split(',') {
            let mut parts = item.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some("t"), Some(value)) => {
                    timestamp = Some(value.parse().map_err(|_| SignatureError::Malformed)?);
                }
                (Some(SIGNATURE_SCHEME), Some(value)) => signatures.push(value.to_string()),
                // Unknown schemes are skipped for forward compatibility.
                _ => {}
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureError::Malformed)?,
            signatures,
        })
    }
}
