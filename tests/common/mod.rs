#![allow(dead_code)]

use axum_test::TestServer;
use cached_redirector::application::services::{LookupService, SeedService};
use cached_redirector::domain::entities::{CachePolicy, SeedEntry};
use cached_redirector::infrastructure::cache::ClientSideCache;
use cached_redirector::infrastructure::store::InMemoryStore;
use cached_redirector::routes::app_router;
use cached_redirector::state::AppState;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_subscriber::fmt::MakeWriter;

pub const HOST: &str = "localhost:8080";
pub const SEED_TTL: Duration = Duration::from_secs(3600);
pub const LOCAL_TTL: Duration = Duration::from_secs(60);
pub const NEGATIVE_TTL: Duration = Duration::from_secs(5);

/// A running router over an in-memory store seeded with the default mappings.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<ClientSideCache>,
    listener: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

pub fn test_policy() -> CachePolicy {
    CachePolicy::new(LOCAL_TTL, NEGATIVE_TTL)
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_policy(test_policy()).await
}

pub async fn spawn_app_with_policy(policy: CachePolicy) -> TestApp {
    let store = Arc::new(InMemoryStore::new());

    SeedService::new(store.clone(), SEED_TTL)
        .seed(&SeedEntry::defaults())
        .await
        .unwrap();

    let cache = Arc::new(ClientSideCache::new(store.clone(), policy));
    let listener = cache.spawn_invalidation_listener();

    let state = AppState::new(
        Arc::new(LookupService::new(cache.clone())),
        Duration::from_millis(500),
        false,
    );
    let server = TestServer::new(app_router(state)).unwrap();

    TestApp {
        server,
        store,
        cache,
        listener,
    }
}

/// Lets spawned tasks (the invalidation listener) run to completion.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
