//! Webhook Delivery Deduplication
//!
//! FedaPay retries webhook deliveries until it sees a 2xx, so the same event
//! can arrive more than once. Handlers that are not naturally idempotent can
//! opt into deduplication by giving the dispatcher an [`IdempotencyStore`].
//!
//! The store is fail-open: if a lookup errors, the dispatcher logs and
//! processes the delivery anyway. Dropping a payment notification is worse
//! than handling one twice behind a broken store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Records which deliveries have already been processed
///
/// `Ok(true)` means the key was newly recorded and the delivery should be
/// processed; `Ok(false)` means it was already present.
#[async_trait::async_trait]
pub trait IdempotencyStore: Send + Sync + 'static {
    /// Atomically record `key`, reporting whether it was absent before
    async fn check_and_record(&self, key: &str) -> anyhow::Result<bool>;
}

/// In-process store with a TTL and a bounded entry count
///
/// Suitable for a single-instance deployment. Behind a load balancer the
/// instances would not see each other's entries; pair the trait with a shared
/// store in that setup.
pub struct InMemoryIdempotencyStore {
    entries: Mutex<HashMap<String, Instant>>,
    ttl: Duration,
    max_entries: usize,
}

impl InMemoryIdempotencyStore {
    /// Create a store that remembers keys for `ttl`, holding at most
    /// `max_entries` at once
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn check_and_record(&self, key: &str) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        entries.retain(|_, recorded| now.duration_since(*recorded) < self.ttl);

        if entries.contains_key(key) {
            return Ok(false);
        }

        if entries.len() >= self.max_entries {
            // Evict the oldest entry. Linear scan is fine at the capacities
            // this store is configured with.
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, recorded)| **recorded)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }

        entries.insert(key.to_string(), now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_delivery_recorded_second_rejected() {
        let store = InMemoryIdempotencyStore::new(Duration::from_secs(60), 100);

        assert!(store.check_and_record("transaction.approved:42").await.unwrap());
        assert!(!store.check_and_record("transaction.approved:42").await.unwrap());
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let store = InMemoryIdempotencyStore::new(Duration::from_secs(60), 100);

        assert!(store.check_and_record("transaction.approved:42").await.unwrap());
        assert!(store.check_and_record("transaction.declined:42").await.unwrap());
        assert!(store.check_and_record("transaction.approved:43").await.unwrap());
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let store = InMemoryIdempotencyStore::new(Duration::from_millis(20), 100);

        assert!(store.check_and_record("transaction.approved:42").await.unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store.check_and_record("transaction.approved:42").await.unwrap());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = InMemoryIdempotencyStore::new(Duration::from_secs(60), 2);

        assert!(store.check_and_record("first").await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.check_and_record("second").await.unwrap());
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.check_and_record("third").await.unwrap());

        assert_eq!(store.len(), 2);
        // "first" was evicted, so it reads as new again.
        assert!(store.check_and_record("first").await.unwrap());
        // "third" is still remembered.
        assert!(!store.check_and_record("third").await.unwrap());
    }
}
