//! FedaPay API Types
//!
//! Strongly-typed representations of the FedaPay transaction objects this relay
//! creates, retrieves, and receives in webhook payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ISO currency code used when none is configured
pub const DEFAULT_CURRENCY_ISO: &str = "XOF";

/// Placeholder first name applied when the frontend sends none
pub const DEFAULT_CUSTOMER_FIRSTNAME: &str = "Guest";

/// Placeholder last name applied when the frontend sends none
pub const DEFAULT_CUSTOMER_LASTNAME: &str = "Customer";

/// A FedaPay transaction
///
/// Owned by the provider; the relay only ever holds the `id` and re-fetches
/// the rest on demand. Status is never cached as a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Provider-assigned numeric identifier
    pub id: i64,

    /// Human-readable reference (trx_...)
    #[serde(default)]
    pub reference: Option<String>,

    /// Amount in minor currency units
    pub amount: i64,

    /// Current lifecycle status
    pub status: TransactionStatus,

    /// Description shown on the checkout page
    #[serde(default)]
    pub description: Option<String>,

    /// URL the customer is sent back to after checkout
    #[serde(default)]
    pub callback_url: Option<String>,

    /// Customer the transaction belongs to
    #[serde(default)]
    pub customer_id: Option<i64>,

    /// Currency the transaction is denominated in
    #[serde(default)]
    pub currency_id: Option<i64>,

    /// Payment mode chosen at checkout (mtn, moov, ...)
    #[serde(default)]
    pub mode: Option<String>,

    /// When the transaction was created
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// When the transaction was last updated
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// When the payment was approved (if it was)
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

/// FedaPay transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created but not yet paid
    Pending,
    /// Paid successfully
    Approved,
    /// Abandoned by the customer
    Canceled,
    /// Refused by the provider or issuer
    Declined,
    /// Paid, then refunded
    Refunded,
    /// Funds transferred out to the merchant
    Transferred,
    /// Catch-all for statuses introduced after this crate was written
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Canceled => "canceled",
            Self::Declined => "declined",
            Self::Refunded => "refunded",
            Self::Transferred => "transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Map this status onto the three redirect outcomes
    ///
    /// `approved` is the only success; `canceled` and `declined` are failures;
    /// everything else (including statuses this crate does not know about)
    /// stays pending.
    pub fn outcome(&self) -> PaymentOutcome {
        match self {
            Self::Approved => PaymentOutcome::Success,
            Self::Canceled | Self::Declined => PaymentOutcome::Failure,
            _ => PaymentOutcome::Pending,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-level outcome of a payment, derived from [`TransactionStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Payment went through
    Success,
    /// Payment was canceled or declined
    Failure,
    /// Payment is still in flight
    Pending,
}

/// Request body for `POST /v1/transactions`
#[derive(Debug, Clone, Serialize)]
pub struct CreateTransactionRequest {
    /// Description shown on the checkout page
    pub description: String,

    /// Amount in minor currency units
    pub amount: u64,

    /// Currency wrapper (`{"iso": "XOF"}` on the wire)
    pub currency: CurrencyIso,

    /// Where FedaPay sends the customer after checkout
    pub callback_url: String,

    /// Customer the transaction is created for
    pub customer: CustomerParams,
}

/// Currency selector as FedaPay expects it
#[derive(Debug, Clone, Serialize)]
pub struct CurrencyIso {
    /// ISO 4217 code, e.g. "XOF"
    pub iso: String,
}

/// Customer fields accepted by transaction creation
#[derive(Debug, Clone, Serialize)]
pub struct CustomerParams {
    /// First name, defaulted when the frontend sends none
    pub firstname: String,
    /// Last name, defaulted when the frontend sends none
    pub lastname: String,
    /// Email the provider attaches the transaction to
    pub email: String,
}

/// Response of `POST /v1/transactions/{id}/token`
///
/// The `url` is the single-use hosted-checkout link the frontend redirects
/// the customer to.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentToken {
    /// Opaque payment token
    pub token: String,
    /// Hosted checkout URL for this token
    pub url: String,
}
