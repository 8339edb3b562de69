//! Payment Initiation Handler
//!
//! `POST /create-payment` turns a frontend checkout request into a hosted
//! FedaPay payment page. The flow is validate, create the transaction,
//! generate the payment token, and hand the checkout URL back:
//!
//! ```json
//! {"paymentUrl": "https://checkout.fedapay.com/pk_tok_abc"}
//! ```
//!
//! Validation failures answer `400 {"error": ...}` without ever contacting
//! the provider; provider failures answer `500 {"error": ...}`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::{Error, Result};
use crate::fedapay::types::{
    CreateTransactionRequest, CurrencyIso, CustomerParams, DEFAULT_CUSTOMER_FIRSTNAME,
    DEFAULT_CUSTOMER_LASTNAME,
};
use crate::handlers::AppState;

/// Checkout request as the frontend sends it
///
/// Every field is optional at the serde level so that missing fields surface
/// as our own validation messages instead of a deserialization rejection.
/// `amount` stays a raw JSON value because frontends send both `5000` and
/// `"5000"`; [`validate`](Self::validate) narrows it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatePaymentRequest {
    /// Amount in minor currency units, as a JSON number or digit string
    pub amount: Option<serde_json::Value>,

    /// Description shown on the checkout page
    pub description: Option<String>,

    /// Customer email the transaction is attached to
    pub customer_email: Option<String>,

    /// Optional customer first name
    pub customer_firstname: Option<String>,

    /// Optional customer last name
    pub customer_lastname: Option<String>,

    /// URL FedaPay sends the customer back to after checkout
    pub callback_url_from_frontend: Option<String>,
}

/// Checkout request after validation, with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPayment {
    /// Amount in minor currency units
    pub amount: u64,
    /// Trimmed description
    pub description: String,
    /// Trimmed customer email
    pub email: String,
    /// Customer first name, defaulted when absent
    pub firstname: String,
    /// Customer last name, defaulted when absent
    pub lastname: String,
    /// Normalized callback URL
    pub callback_url: String,
}

impl CreatePaymentRequest {
    /// Validate the request, producing the exact values sent to the provider
    ///
    /// The first failing check wins. Amounts must be whole: FedaPay amounts
    /// are minor currency units (XOF has no subunit), so a fractional amount
    /// is a frontend bug that must not be silently truncated.
    pub fn validate(&self) -> Result<ValidatedPayment> {
        let amount = match &self.amount {
            Some(value) => validate_amount(value)?,
            None => return Err(Error::validation("amount is required")),
        };

        let description = require_text(&self.description, "description")?;
        let email = require_text(&self.customer_email, "customer_email")?;
        validate_email(&email)?;
        let callback_url = require_text(
            &self.callback_url_from_frontend,
            "callback_url_from_frontend",
        )?;
        let callback_url = validate_callback_url(&callback_url)?;

        let firstname = optional_text(&self.customer_firstname)
            .unwrap_or_else(|| DEFAULT_CUSTOMER_FIRSTNAME.to_string());
        let lastname = optional_text(&self.customer_lastname)
            .unwrap_or_else(|| DEFAULT_CUSTOMER_LASTNAME.to_string());

        Ok(ValidatedPayment {
            amount,
            description,
            email,
            firstname,
            lastname,
            callback_url,
        })
    }
}

/// Success response carrying the hosted checkout URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUrlResponse {
    /// Single-use hosted checkout URL
    #[serde(rename = "paymentUrl")]
    pub payment_url: String,
}

/// `POST /create-payment`
#[instrument(skip_all)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "Rejecting unreadable payment request");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid JSON body: {}", rejection.body_text()),
            );
        }
    };

    match initiate_payment(&state, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            match &e {
                Error::Validation(_) => debug!(error = %e, "Payment request failed validation"),
                _ => error!(error = %e, "Payment initiation failed"),
            }
            error_response(e.status_code(), e.to_string())
        }
    }
}

async fn initiate_payment(
    state: &AppState,
    request: CreatePaymentRequest,
) -> Result<PaymentUrlResponse> {
    let validated = request.validate()?;

    let create = CreateTransactionRequest {
        description: validated.description,
        amount: validated.amount,
        currency: CurrencyIso {
            iso: state.currency_iso().to_string(),
        },
        callback_url: validated.callback_url,
        customer: CustomerParams {
            firstname: validated.firstname,
            lastname: validated.lastname,
            email: validated.email,
        },
    };

    let transaction = state.client().create_transaction(&create).await?;
    let token = state.client().generate_payment_token(transaction.id).await?;

    state.record_payment_initiated();
    info!(
        transaction_id = transaction.id,
        amount = create.amount,
        "Payment link issued"
    );

    Ok(PaymentUrlResponse {
        payment_url: token.url,
    })
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn validate_amount(value: &serde_json::Value) -> Result<u64> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(amount) = n.as_u64() {
                if amount == 0 {
                    Err(Error::validation("amount must be greater than zero"))
                } else {
                    Ok(amount)
                }
            } else if n.as_i64().is_some() {
                Err(Error::validation("amount must be greater than zero"))
            } else {
                Err(Error::validation(
                    "amount must be a whole number of minor currency units",
                ))
            }
        }
        serde_json::Value::String(s) => match s.trim().parse::<u64>() {
            Ok(0) => Err(Error::validation("amount must be greater than zero")),
            Ok(amount) => Ok(amount),
            Err(_) => Err(Error::validation(
                "amount must be a whole number of minor currency units",
            )),
        },
        _ => Err(Error::validation("amount must be a number")),
    }
}

fn validate_email(email: &str) -> Result<()> {
    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });

    if well_formed {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "customer_email is not a valid email address: {email}"
        )))
    }
}

fn validate_callback_url(raw: &str) -> Result<String> {
    let url = url::Url::parse(raw).map_err(|e| {
        Error::validation(format!("callback_url_from_frontend is not a valid URL: {e}"))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            "callback_url_from_frontend must be an http(s) URL",
        ));
    }

    Ok(url.into())
}

fn require_text(field: &Option<String>, name: &str) -> Result<String> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::validation(format!("{name} is required"))),
    }
}

fn optional_text(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
