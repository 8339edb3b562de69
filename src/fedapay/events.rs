//! FedaPay Webhook Event Types
//!
//! Strongly-typed representations of the webhook payloads FedaPay delivers.
//! A [`WebhookEvent`] is only ever constructed from bytes that already passed
//! signature verification; see
//! [`SignatureVerifier::construct_event`](crate::fedapay::SignatureVerifier::construct_event).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fedapay::types::Transaction;

/// Webhook event names FedaPay delivers for transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEventKind {
    /// A transaction was created
    #[serde(rename = "transaction.created")]
    TransactionCreated,
    /// The customer completed the payment
    #[serde(rename = "transaction.approved")]
    TransactionApproved,
    /// The customer abandoned the payment
    #[serde(rename = "transaction.canceled")]
    TransactionCanceled,
    /// The provider or issuer refused the payment
    #[serde(rename = "transaction.declined")]
    TransactionDeclined,
    /// A completed payment was refunded
    #[serde(rename = "transaction.refunded")]
    TransactionRefunded,
    /// Funds were transferred out to the merchant
    #[serde(rename = "transaction.transferred")]
    TransactionTransferred,

    /// Catch-all for event names we don't explicitly handle
    #[serde(other)]
    Unknown,
}

impl FromStr for WebhookEventKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "transaction.created" => Self::TransactionCreated,
            "transaction.approved" => Self::TransactionApproved,
            "transaction.canceled" => Self::TransactionCanceled,
            "transaction.declined" => Self::TransactionDeclined,
            "transaction.refunded" => Self::TransactionRefunded,
            "transaction.transferred" => Self::TransactionTransferred,
            _ => Self::Unknown,
        })
    }
}

impl WebhookEventKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionCreated => "transaction.created",
            Self::TransactionApproved => "transaction.approved",
            Self::TransactionCanceled => "transaction.canceled",
            Self::TransactionDeclined => "transaction.declined",
            Self::TransactionRefunded => "transaction.refunded",
            Self::TransactionTransferred => "transaction.transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Check if this is a known event kind
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Generic FedaPay event envelope: `{"name": ..., "data": {"object": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `transaction.approved`
    pub name: String,

    /// Object container carried by the event
    pub data: EventData,
}

/// Event data container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    /// The entity the event is about (transaction-shaped for `transaction.*`)
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Parse from raw JSON bytes
    ///
    /// The caller is responsible for having verified the signature over these
    /// exact bytes first; the HTTP path goes through
    /// [`SignatureVerifier::construct_event`](crate::fedapay::SignatureVerifier::construct_event)
    /// which enforces that ordering.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::decode(e.to_string()))
    }

    /// Get the typed event kind
    pub fn kind(&self) -> WebhookEventKind {
        // Infallible error type means this can never fail
        WebhookEventKind::from_str(&self.name).unwrap()
    }

    /// Extract the transaction carried in `data.object`
    pub fn transaction(&self) -> Result<Transaction> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            Error::decode(format!(
                "event '{}' does not carry a transaction object: {e}",
                self.name
            ))
        })
    }
}
