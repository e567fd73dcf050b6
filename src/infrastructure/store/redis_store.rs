//! Redis-backed remote store with RESP3 client tracking.

use crate::domain::repositories::{
    RemoteStore, SetOutcome, StoreError, StoreEvent, StoreResult, StoredValue,
};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, PushInfo, PushKind, RedisError, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Buffered invalidation events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 1024;

/// Redis client used as the store of record.
///
/// The connection runs in RESP3 mode with `CLIENT TRACKING ON`, so Redis pushes an
/// `invalidate` message for every key this client has read once that key changes.
/// Push messages are forwarded to subscribers as [`StoreEvent`]s.
///
/// `ConnectionManager` reconnects transparently, but tracking state lives on the
/// server connection. After a disconnect the store emits
/// [`StoreEvent::Disconnected`] and re-enables tracking before the next read.
pub struct RedisStore {
    client: ConnectionManager,
    events: broadcast::Sender<StoreEvent>,
    tracking: Arc<AtomicBool>,
    push_forwarder: JoinHandle<()>,
}

impl RedisStore {
    /// Connects to Redis, validates the connection with a PING and enables client tracking.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string with `protocol=resp3`
    ///   (e.g., `"redis://localhost:6379/?protocol=resp3"`)
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails. Returns
    /// [`StoreError::Protocol`] if the server refuses `CLIENT TRACKING`.
    pub async fn connect(redis_url: &str) -> StoreResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            StoreError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let config = ConnectionManagerConfig::new().set_push_sender(push_tx);

        let manager = ConnectionManager::new_with_config(client, config)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let tracking = Arc::new(AtomicBool::new(false));
        let push_forwarder = tokio::spawn(forward_push_messages(
            push_rx,
            events.clone(),
            tracking.clone(),
        ));

        let store = Self {
            client: manager,
            events,
            tracking,
            push_forwarder,
        };

        store.ping().await?;
        store.enable_tracking().await?;

        info!("✓ Connected to Redis (client tracking enabled)");

        Ok(store)
    }

    async fn enable_tracking(&self) -> StoreResult<()> {
        let mut conn = self.client.clone();
        redis::cmd("CLIENT")
            .arg("TRACKING")
            .arg("ON")
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_error)?;

        self.tracking.store(true, Ordering::Release);
        debug!("CLIENT TRACKING ON");
        Ok(())
    }
}

impl Drop for RedisStore {
    fn drop(&mut self) {
        self.push_forwarder.abort();
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        if !self.tracking.load(Ordering::Acquire) {
            self.enable_tracking().await?;
        }

        let mut conn = self.client.clone();
        let (value, pttl): (Value, i64) = redis::pipe()
            .cmd("GET")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        let stored = decode_value(value)?.map(|value| StoredValue {
            value,
            ttl: remote_ttl(pttl),
        });

        match &stored {
            Some(v) => debug!("Redis GET {} -> {} (TTL: {:?})", key, v.value, v.ttl),
            None => debug!("Redis GET {} -> nil", key),
        }

        Ok(stored)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> StoreResult<SetOutcome> {
        let mut conn = self.client.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        let reply: Value = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        let outcome = match reply {
            Value::Nil => SetOutcome::AlreadyExists,
            _ => SetOutcome::Inserted,
        };

        debug!(
            "Redis SETNX {} -> {} (TTL: {}s): {:?}",
            key, value, ttl_seconds, outcome
        );
        Ok(outcome)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.client.clone();
        conn.ping::<()>()
            .await
            .map_err(|e| StoreError::Connection(format!("Redis PING failed: {}", e)))
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Translates RESP3 push messages into store events until the connection is dropped.
async fn forward_push_messages(
    mut rx: mpsc::UnboundedReceiver<PushInfo>,
    events: broadcast::Sender<StoreEvent>,
    tracking: Arc<AtomicBool>,
) {
    while let Some(push) = rx.recv().await {
        let event = match push.kind {
            PushKind::Invalidate => invalidation_event(push.data),
            PushKind::Disconnection => {
                tracking.store(false, Ordering::Release);
                warn!("Redis connection lost; invalidations may have been missed");
                Some(StoreEvent::Disconnected)
            }
            _ => None,
        };

        if let Some(event) = event {
            // No subscribers is fine: nothing is cached locally yet.
            let _ = events.send(event);
        }
    }
}

/// Builds an event from the payload of an `invalidate` push.
///
/// The payload is an array of keys, or nil when the server flushed everything.
fn invalidation_event(data: Vec<Value>) -> Option<StoreEvent> {
    match data.into_iter().next() {
        Some(Value::Array(keys)) => Some(StoreEvent::Invalidate(
            keys.into_iter()
                .filter_map(|key| decode_value(key).ok().flatten())
                .collect(),
        )),
        Some(Value::Nil) | None => Some(StoreEvent::InvalidateAll),
        Some(other) => {
            warn!("Unexpected invalidation payload: {:?}", other);
            None
        }
    }
}

/// Decodes a string reply; nil is the "key absent" sentinel.
fn decode_value(value: Value) -> StoreResult<Option<String>> {
    match value {
        Value::Nil => Ok(None),
        Value::BulkString(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::InvalidValue(format!("value is not UTF-8: {}", e))),
        Value::SimpleString(s) => Ok(Some(s)),
        other => Err(StoreError::InvalidValue(format!(
            "expected a string reply, got {:?}",
            other
        ))),
    }
}

/// Converts a PTTL reply into a remaining TTL. Negative replies mean "no expiry".
fn remote_ttl(pttl: i64) -> Option<Duration> {
    u64::try_from(pttl).ok().map(Duration::from_millis)
}

fn map_redis_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::Connection(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}
