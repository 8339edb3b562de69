//! FedaPay API Client
//!
//! Async client for the three REST calls the relay makes against the
//! FedaPay API: create a transaction, generate its payment-page token, and
//! re-fetch a transaction by id.
//!
//! Single-resource responses arrive wrapped in a `"v1/<resource>"` envelope:
//!
//! ```json
//! {"v1/transaction": {"id": 142417, "status": "pending", ...}}
//! ```
//!
//! The token endpoint is the exception and returns `{"token", "url"}`
//! directly. Error responses carry a `{"message": ...}` body.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{Error, ProviderError, Result};
use crate::fedapay::types::{CreateTransactionRequest, PaymentToken, Transaction};

/// Client for the FedaPay REST API
///
/// Built once at startup from [`ProviderConfig`] and shared behind the
/// application state; `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct FedapayClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl FedapayClient {
    /// Build a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("fedapay-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    /// Create a transaction and return its server-side representation
    pub async fn create_transaction(
        &self,
        request: &CreateTransactionRequest,
    ) -> Result<Transaction> {
        debug!(
            amount = request.amount,
            currency = %request.currency.iso,
            "Creating FedaPay transaction"
        );

        let envelope: TransactionEnvelope = self
            .execute(self.http.post(self.endpoint("transactions")).json(request))
            .await?;

        debug!(transaction_id = envelope.transaction.id, "Transaction created");
        Ok(envelope.transaction)
    }

    /// Generate the hosted payment-page token and URL for a transaction
    pub async fn generate_payment_token(&self, transaction_id: i64) -> Result<PaymentToken> {
        debug!(transaction_id, "Generating payment token");

        self.execute(
            self.http
                .post(self.endpoint(&format!("transactions/{transaction_id}/token"))),
        )
        .await
    }

    /// Fetch the authoritative state of a transaction by id
    pub async fn retrieve_transaction(&self, transaction_id: i64) -> Result<Transaction> {
        debug!(transaction_id, "Retrieving transaction");

        let envelope: TransactionEnvelope = self
            .execute(
                self.http
                    .get(self.endpoint(&format!("transactions/{transaction_id}"))),
            )
            .await?;

        Ok(envelope.transaction)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&body, status),
            }
            .into());
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{e} in body: {body}")).into())
    }
}

/// Envelope FedaPay wraps single transactions in
#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    #[serde(rename = "v1/transaction")]
    transaction: Transaction,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Extract a human-readable message from an error response body
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("no response body")
                    .to_string()
            } else {
                // Unstructured body, keep a bounded prefix for the logs.
                body.chars().take(200).collect()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::time::Duration;

    fn config() -> ProviderConfig {
        ProviderConfig {
            secret_key: SecretString::from("sk_sandbox_test"),
            environment: Environment::Sandbox,
            api_base: None,
            request_timeout: Duration::from_secs(5),
            currency_iso: "XOF".to_string(),
        }
    }

    #[test]
    fn test_endpoint_formation() {
        let client = FedapayClient::new(&config()).unwrap();
        assert_eq!(
            client.endpoint("transactions"),
            "https://sandbox-api.fedapay.com/v1/transactions"
        );
        assert_eq!(
            client.endpoint("transactions/42/token"),
            "https://sandbox-api.fedapay.com/v1/transactions/42/token"
        );
    }

    #[test]
    fn test_endpoint_strips_trailing_slash_from_override() {
        let mut cfg = config();
        cfg.api_base = Some("http://localhost:8080/".to_string());
        let client = FedapayClient::new(&cfg).unwrap();
        assert_eq!(
            client.endpoint("transactions"),
            "http://localhost:8080/v1/transactions"
        );
    }

    #[test]
    fn test_error_message_from_json_body() {
        let message = error_message(
            r#"{"message":"Amount must be greater than 0"}"#,
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert_eq!(message, "Amount must be greater than 0");
    }

    #[test]
    fn test_error_message_fallback_to_raw_body() {
        let message = error_message("upstream gateway timeout", StatusCode::BAD_GATEWAY);
        assert_eq!(message, "upstream gateway timeout");
    }

    #[test]
    fn test_error_message_fallback_to_status_reason() {
        let message = error_message("", StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal Server Error");
    }

    #[test]
    fn test_transaction_envelope_deserializes() {
        let body = r#"{
            "v1/transaction": {
                "id": 142417,
                "reference": "trx_1_1679999999",
                "amount": 5000,
                "status": "pending"
            }
        }"#;
        let envelope: TransactionEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.transaction.id, 142417);
        assert_eq!(envelope.transaction.amount, 5000);
    }

    #[test]
    fn test_payment_token_is_not_enveloped() {
        let body = r#"{"token":"pk_tok_abc","url":"https://checkout.fedapay.com/pk_tok_abc"}"#;
        let token: PaymentToken = serde_json::from_str(body).unwrap();
        assert_eq!(token.url, "https://checkout.fedapay.com/pk_tok_abc");
    }
}
