//! Lookup facade over the client-side cache.

use crate::domain::repositories::{LookupCache, LookupError, LookupOutcome, LookupResult};
use crate::infrastructure::cache::ClientSideCache;
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::time::{Instant, timeout_at};

/// Resolves redirect keys through a [`ClientSideCache`].
///
/// Translates store replies into the [`LookupCache`] contract:
///
/// - absent key or empty value → [`LookupOutcome::NotFound`]
/// - stored value → [`LookupOutcome::Found`]
/// - store failure → [`LookupError::Store`]
/// - no answer before the deadline → [`LookupError::DeadlineExceeded`]
pub struct LookupService {
    cache: Arc<ClientSideCache>,
}

impl LookupService {
    /// Creates a new lookup service.
    pub fn new(cache: Arc<ClientSideCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl LookupCache for LookupService {
    async fn lookup(&self, key: &str, deadline: Instant) -> LookupResult {
        let fetched = match timeout_at(deadline, self.cache.get(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                counter!("redirector_lookups_total", "outcome" => "error").increment(1);
                return Err(LookupError::Store(e));
            }
            Err(_) => {
                counter!("redirector_lookups_total", "outcome" => "timeout").increment(1);
                return Err(LookupError::DeadlineExceeded);
            }
        };

        match fetched {
            Some(target) if !target.is_empty() => {
                counter!("redirector_lookups_total", "outcome" => "found").increment(1);
                Ok(LookupOutcome::Found(target))
            }
            _ => {
                counter!("redirector_lookups_total", "outcome" => "not_found").increment(1);
                Ok(LookupOutcome::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CachePolicy;
    use crate::domain::repositories::{
        MockRemoteStore, RemoteStore, SetOutcome, StoreError, StoreEvent, StoreResult,
        StoredValue,
    };
    use std::time::Duration;
    use tokio::sync::broadcast;

    fn service(store: MockRemoteStore) -> LookupService {
        let cache = ClientSideCache::new(Arc::new(store), CachePolicy::default());
        LookupService::new(Arc::new(cache))
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(1)
    }

    #[tokio::test]
    async fn test_lookup_found() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get()
            .withf(|key| key == "http://localhost:8080/")
            .times(1)
            .returning(|_| {
                Ok(Some(StoredValue {
                    value: "https://www.google.com/".to_string(),
                    ttl: None,
                }))
            });

        let result = service(store)
            .lookup("http://localhost:8080/", deadline())
            .await;

        assert_eq!(
            result.unwrap(),
            LookupOutcome::Found("https://www.google.com/".to_string())
        );
    }

    #[tokio::test]
    async fn test_lookup_absent_key_is_not_an_error() {
        let mut store = MockRemoteStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let result = service(store).lookup("http://localhost:8080/x", deadline()).await;

        assert_eq!(result.unwrap(), LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_empty_value_is_not_found() {
        let mut store = MockRemoteStore::new();
        store.expect_get().times(1).returning(|_| {
            Ok(Some(StoredValue {
                value: String::new(),
                ttl: None,
            }))
        });

        let result = service(store).lookup("http://localhost:8080/x", deadline()).await;

        assert_eq!(result.unwrap(), LookupOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_lookup_store_error_propagates() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|_| Err(StoreError::Protocol("ERR unknown command".to_string())));

        let result = service(store).lookup("http://localhost:8080/", deadline()).await;

        assert!(matches!(
            result,
            Err(LookupError::Store(StoreError::Protocol(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_deadline_exceeded() {
        struct SlowStore;

        #[async_trait]
        impl RemoteStore for SlowStore {
            async fn get(&self, _key: &str) -> StoreResult<Option<StoredValue>> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(None)
            }

            async fn set_if_absent(
                &self,
                _key: &str,
                _value: &str,
                _ttl: Duration,
            ) -> StoreResult<SetOutcome> {
                Ok(SetOutcome::Inserted)
            }

            async fn ping(&self) -> StoreResult<()> {
                Ok(())
            }

            fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
                broadcast::channel(1).1
            }
        }

        let cache = ClientSideCache::new(Arc::new(SlowStore), CachePolicy::default());
        let service = LookupService::new(Arc::new(cache));

        let result = service
            .lookup("http://localhost:8080/", Instant::now() + Duration::from_millis(500))
            .await;

        assert!(matches!(result, Err(LookupError::DeadlineExceeded)));
    }
}
