//! Webhook Event Dispatch
//!
//! Routes verified webhook events to business handlers. Dispatch runs inline
//! in the request before the delivery is acknowledged:
//!
//! ```text
//! Webhook Received
//!       |
//!       v
//! [Verify Signature] --> invalid? --> 400, provider keeps the delivery
//!       |
//!       v
//! [Decode Event]
//!       |
//!       v
//! [Check Idempotency] --> already processed? --> 200, no handler call
//!       |
//!       v
//! [Run Handler] --> error? --> logged, still 200 (default policy)
//!       |
//!       v
//! [200 {"received": true}]
//! ```
//!
//! A handler whose work must not be lost can override
//! [`TransactionHandler::request_redelivery_on_error`]; its failures then
//! surface as a 5xx and FedaPay redelivers the event later.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fedapay::events::{WebhookEvent, WebhookEventKind};
use crate::fedapay::idempotency::IdempotencyStore;
use crate::fedapay::types::Transaction;

/// Handler trait for transaction lifecycle events
///
/// Implementations receive the transaction object carried in the webhook
/// payload. Anything authoritative (fulfilment, ledger writes) should key off
/// `transaction.id` and re-fetch if it needs more than the payload carries.
#[async_trait::async_trait]
pub trait TransactionHandler: Send + Sync + 'static {
    /// Handle a completed payment
    async fn on_approved(&self, transaction: &Transaction) -> anyhow::Result<()>;

    /// Handle a payment the customer abandoned
    async fn on_canceled(&self, transaction: &Transaction) -> anyhow::Result<()>;

    /// Handle a payment the provider or issuer refused
    async fn on_declined(&self, transaction: &Transaction) -> anyhow::Result<()>;

    /// Whether a handler error should fail the delivery so FedaPay retries it
    ///
    /// Defaults to `false`: errors are logged and the delivery is still
    /// acknowledged, so a handler bug cannot put the endpoint into a retry
    /// loop with the provider.
    fn request_redelivery_on_error(&self) -> bool {
        false
    }
}

/// What the dispatcher did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran and succeeded
    Handled,
    /// A handler ran and failed, and the delivery is acknowledged anyway
    Failed,
    /// No handler is registered for this event kind
    Ignored,
    /// The idempotency store had already seen this delivery
    Duplicate,
}

/// Routes verified events to the registered [`TransactionHandler`]
#[derive(Clone)]
pub struct EventDispatcher {
    handler: Arc<dyn TransactionHandler>,
    idempotency: Option<Arc<dyn IdempotencyStore>>,
}

impl EventDispatcher {
    /// Create a dispatcher without deduplication
    pub fn new(handler: Arc<dyn TransactionHandler>) -> Self {
        Self {
            handler,
            idempotency: None,
        }
    }

    /// Deduplicate deliveries through `store`
    ///
    /// Keys are `"{event_name}:{transaction_id}"`, so an approval and a
    /// decline for the same transaction are distinct deliveries.
    pub fn with_idempotency(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.idempotency = Some(store);
        self
    }

    /// Dispatch a verified event to the handler
    ///
    /// Errors are only returned where the HTTP layer must not acknowledge the
    /// delivery: an undecodable transaction payload, or a handler failure
    /// when the handler requests redelivery.
    pub async fn dispatch(&self, event: &WebhookEvent) -> Result<DispatchOutcome> {
        let kind = event.kind();

        if !matches!(
            kind,
            WebhookEventKind::TransactionApproved
                | WebhookEventKind::TransactionCanceled
                | WebhookEventKind::TransactionDeclined
        ) {
            debug!(
                event_name = %event.name,
                known = kind.is_known(),
                "No handler for event, acknowledging without action"
            );
            return Ok(DispatchOutcome::Ignored);
        }

        let transaction = event.transaction()?;

        if let Some(store) = &self.idempotency {
            let key = format!("{}:{}", event.name, transaction.id);
            match store.check_and_record(&key).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        event_name = %event.name,
                        transaction_id = transaction.id,
                        "Duplicate delivery, skipping handler"
                    );
                    return Ok(DispatchOutcome::Duplicate);
                }
                Err(e) => {
                    // Fail open: losing a notification is worse than a
                    // double-handled one.
                    warn!(
                        event_name = %event.name,
                        transaction_id = transaction.id,
                        error = %e,
                        "Idempotency store unavailable, processing anyway"
                    );
                }
            }
        }

        let result = match kind {
            WebhookEventKind::TransactionApproved => self.handler.on_approved(&transaction).await,
            WebhookEventKind::TransactionCanceled => self.handler.on_canceled(&transaction).await,
            WebhookEventKind::TransactionDeclined => self.handler.on_declined(&transaction).await,
            // Filtered above
            _ => Ok(()),
        };

        match result {
            Ok(()) => {
                info!(
                    event_name = %event.name,
                    transaction_id = transaction.id,
                    "Event dispatched"
                );
                Ok(DispatchOutcome::Handled)
            }
            Err(e) if self.handler.request_redelivery_on_error() => {
                warn!(
                    event_name = %event.name,
                    transaction_id = transaction.id,
                    error = %e,
                    "Handler failed, requesting redelivery"
                );
                Err(Error::Handler(e))
            }
            Err(e) => {
                warn!(
                    event_name = %event.name,
                    transaction_id = transaction.id,
                    error = %e,
                    "Handler failed, acknowledging delivery anyway"
                );
                Ok(DispatchOutcome::Failed)
            }
        }
    }
}

/// Handler that does nothing, for wiring and tests
#[derive(Clone)]
pub struct NoOpHandler;

#[async_trait::async_trait]
impl TransactionHandler for NoOpHandler {
    async fn on_approved(&self, _transaction: &Transaction) -> anyhow::Result<()> {
        Ok(())
    }
    async fn on_canceled(&self, _transaction: &Transaction) -> anyhow::Result<()> {
        Ok(())
    }
    async fn on_declined(&self, _transaction: &Transaction) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Handler that logs each event, the default wiring of the binary
///
/// Deployments with real fulfilment logic replace this with their own
/// [`TransactionHandler`] implementation.
#[derive(Clone)]
pub struct LoggingHandler;

#[async_trait::async_trait]
impl TransactionHandler for LoggingHandler {
    async fn on_approved(&self, transaction: &Transaction) -> anyhow::Result<()> {
        info!(
            transaction_id = transaction.id,
            reference = ?transaction.reference,
            amount = transaction.amount,
            mode = ?transaction.mode,
            "Transaction approved"
        );
        Ok(())
    }

    async fn on_canceled(&self, transaction: &Transaction) -> anyhow::Result<()> {
        info!(
            transaction_id = transaction.id,
            reference = ?transaction.reference,
            "Transaction canceled"
        );
        Ok(())
    }

    async fn on_declined(&self, transaction: &Transaction) -> anyhow::Result<()> {
        warn!(
            transaction_id = transaction.id,
            reference = ?transaction.reference,
            amount = transaction.amount,
            "Transaction declined"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fedapay::idempotency::InMemoryIdempotencyStore;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;

    /// Test handler that tracks calls
    struct TestHandler {
        approved_calls: AtomicU32,
        canceled_calls: AtomicU32,
        declined_calls: AtomicU32,
        should_fail: AtomicBool,
        redelivery: bool,
    }

    impl TestHandler {
        fn new() -> Self {
            Self {
                approved_calls: AtomicU32::new(0),
                canceled_calls: AtomicU32::new(0),
                declined_calls: AtomicU32::new(0),
                should_fail: AtomicBool::new(false),
                redelivery: false,
            }
        }

        fn failing() -> Self {
            let handler = Self::new();
            handler.should_fail.store(true, Ordering::SeqCst);
            handler
        }

        fn failing_with_redelivery() -> Self {
            let mut handler = Self::failing();
            handler.redelivery = true;
            handler
        }
    }

    #[async_trait::async_trait]
    impl TransactionHandler for TestHandler {
        async fn on_approved(&self, _transaction: &Transaction) -> anyhow::Result<()> {
            self.approved_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail.load(Ordering::SeqCst) {
                anyhow::bail!("simulated handler failure");
            }
            Ok(())
        }
        async fn on_canceled(&self, _transaction: &Transaction) -> anyhow::Result<()> {
            self.canceled_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn on_declined(&self, _transaction: &Transaction) -> anyhow::Result<()> {
            self.declined_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn request_redelivery_on_error(&self) -> bool {
            self.redelivery
        }
    }

    fn event(name: &str, transaction_id: i64) -> WebhookEvent {
        let json = format!(
            r#"{{
                "name": "{name}",
                "data": {{
                    "object": {{
                        "id": {transaction_id},
                        "reference": "trx_{transaction_id}",
                        "amount": 5000,
                        "status": "approved"
                    }}
                }}
            }}"#
        );
        WebhookEvent::from_bytes(json.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_approved_event_reaches_handler() {
        let handler = Arc::new(TestHandler::new());
        let dispatcher = EventDispatcher::new(handler.clone());

        let outcome = dispatcher
            .dispatch(&event("transaction.approved", 42))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.canceled_calls.load(Ordering::SeqCst), 0);
        assert_eq!(handler.declined_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_each_kind_routes_to_its_method() {
        let handler = Arc::new(TestHandler::new());
        let dispatcher = EventDispatcher::new(handler.clone());

        dispatcher
            .dispatch(&event("transaction.canceled", 1))
            .await
            .unwrap();
        dispatcher
            .dispatch(&event("transaction.declined", 2))
            .await
            .unwrap();

        assert_eq!(handler.canceled_calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.declined_calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unhandled_kinds_are_ignored() {
        let handler = Arc::new(TestHandler::new());
        let dispatcher = EventDispatcher::new(handler.clone());

        let created = dispatcher
            .dispatch(&event("transaction.created", 42))
            .await
            .unwrap();
        let unknown = dispatcher
            .dispatch(&event("customer.updated", 42))
            .await
            .unwrap();

        assert_eq!(created, DispatchOutcome::Ignored);
        assert_eq!(unknown, DispatchOutcome::Ignored);
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_is_acknowledged_by_default() {
        let handler = Arc::new(TestHandler::failing());
        let dispatcher = EventDispatcher::new(handler.clone());

        let outcome = dispatcher
            .dispatch(&event("transaction.approved", 42))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_failure_with_redelivery_policy_is_an_error() {
        let handler = Arc::new(TestHandler::failing_with_redelivery());
        let dispatcher = EventDispatcher::new(handler.clone());

        let err = dispatcher
            .dispatch(&event("transaction.approved", 42))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Handler(_)));
    }

    #[tokio::test]
    async fn test_duplicate_delivery_skips_handler() {
        let handler = Arc::new(TestHandler::new());
        let store = Arc::new(InMemoryIdempotencyStore::new(
            Duration::from_secs(3600),
            1000,
        ));
        let dispatcher = EventDispatcher::new(handler.clone()).with_idempotency(store);

        let first = dispatcher
            .dispatch(&event("transaction.approved", 42))
            .await
            .unwrap();
        let second = dispatcher
            .dispatch(&event("transaction.approved", 42))
            .await
            .unwrap();

        assert_eq!(first, DispatchOutcome::Handled);
        assert_eq!(second, DispatchOutcome::Duplicate);
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_idempotency_key_includes_event_name() {
        let handler = Arc::new(TestHandler::new());
        let store = Arc::new(InMemoryIdempotencyStore::new(
            Duration::from_secs(3600),
            1000,
        ));
        let dispatcher = EventDispatcher::new(handler.clone()).with_idempotency(store);

        dispatcher
            .dispatch(&event("transaction.canceled", 42))
            .await
            .unwrap();
        let outcome = dispatcher
            .dispatch(&event("transaction.declined", 42))
            .await
            .unwrap();

        // Different lifecycle events for the same transaction both process.
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(handler.canceled_calls.load(Ordering::SeqCst), 1);
        assert_eq!(handler.declined_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recognized_event_without_transaction_object_is_decode_error() {
        let handler = Arc::new(TestHandler::new());
        let dispatcher = EventDispatcher::new(handler.clone());

        let json = r#"{"name":"transaction.approved","data":{"object":{"note":"no id here"}}}"#;
        let event = WebhookEvent::from_bytes(json.as_bytes()).unwrap();

        let err = dispatcher.dispatch(&event).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(handler.approved_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_noop_and_logging_handlers_succeed() {
        for dispatcher in [
            EventDispatcher::new(Arc::new(NoOpHandler)),
            EventDispatcher::new(Arc::new(LoggingHandler)),
        ] {
            let outcome = dispatcher
                .dispatch(&event("transaction.approved", 42))
                .await
                .unwrap();
            assert_eq!(outcome, DispatchOutcome::Handled);
        }
    }
}
