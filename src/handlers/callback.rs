//! Redirect Reconciliation Handler
//!
//! `GET /payment-callback` is where FedaPay sends the customer's browser
//! after checkout. The query string carries a `status` parameter, but anyone
//! can type a URL: that hint is logged and otherwise ignored. The handler
//! re-fetches the transaction from the API and routes on what the provider
//! actually says:
//!
//! - `approved` -> success URL with `?transaction_id=`
//! - `canceled` or `declined` -> failure URL with `?transaction_id=&status=`
//! - anything else -> pending URL with `?transaction_id=&status=`
//!
//! Errors here answer plain text, not JSON: the client is a browser mid
//! navigation, not the frontend's fetch code.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::RedirectTargets;
use crate::error::{Error, Result};
use crate::fedapay::types::{PaymentOutcome, TransactionStatus};
use crate::handlers::AppState;

/// Query parameters FedaPay appends to the callback URL
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CallbackParams {
    /// Transaction id, required
    pub id: Option<String>,

    /// Status hint carried in the URL; never trusted
    pub status: Option<String>,
}

/// `GET /payment-callback`
#[instrument(skip_all)]
pub async fn payment_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match reconcile(&state, &params).await {
        Ok(target) => Redirect::to(target.as_str()).into_response(),
        Err(e) => {
            match &e {
                Error::Validation(_) => debug!(error = %e, "Rejecting callback"),
                _ => error!(error = %e, "Callback reconciliation failed"),
            }
            (e.status_code(), e.to_string()).into_response()
        }
    }
}

async fn reconcile(state: &AppState, params: &CallbackParams) -> Result<Url> {
    let transaction_id = parse_transaction_id(params)?;

    if let Some(hint) = params.status.as_deref() {
        // Informational only. The redirect decision below never reads it.
        debug!(
            transaction_id,
            status_hint = hint,
            "Callback carried a status hint, re-fetching authoritative status"
        );
    }

    let transaction = state.client().retrieve_transaction(transaction_id).await?;
    state.record_callback();

    info!(
        transaction_id,
        status = %transaction.status,
        "Redirecting customer by verified status"
    );

    Ok(redirect_target(
        state.redirects(),
        transaction_id,
        transaction.status,
    ))
}

fn parse_transaction_id(params: &CallbackParams) -> Result<i64> {
    let raw = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::validation("Missing transaction ID in callback"))?;

    raw.parse()
        .map_err(|_| Error::validation(format!("Invalid transaction ID in callback: {raw}")))
}

/// Pick the frontend URL for a verified status
///
/// The failure and pending targets carry the status so the frontend can
/// show why; the success target does not need it.
fn redirect_target(
    targets: &RedirectTargets,
    transaction_id: i64,
    status: TransactionStatus,
) -> Url {
    let (base, with_status) = match status.outcome() {
        PaymentOutcome::Success => (&targets.success_url, false),
        PaymentOutcome::Failure => (&targets.failure_url, true),
        PaymentOutcome::Pending => (&targets.pending_url, true),
    };

    let mut url = base.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("transaction_id", &transaction_id.to_string());
        if with_status {
            pairs.append_pair("status", status.as_str());
        }
    }
    url
}
