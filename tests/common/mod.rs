//! Общие помощники интеграционных тестов.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use thoonk::{
    engine::{Reply, Watch},
    InMemoryStore, Notification, PublisherClient, Storage, SubscriberClient, ThoonkResult,
    Transaction,
};
use tokio::sync::mpsc;

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Хранилище, издатель и подписчик поверх одного `InMemoryStore`.
pub fn setup() -> (InMemoryStore, PublisherClient, SubscriberClient) {
    let store = InMemoryStore::new();
    let publisher = PublisherClient::new(Arc::new(store.clone()));
    let subscriber = SubscriberClient::in_memory(&store);
    (store, publisher, subscriber)
}

/// Регистрирует обработчик, пересылающий уведомления в канал.
pub async fn collect(
    subscriber: &SubscriberClient,
    event: &str,
) -> mpsc::UnboundedReceiver<Notification> {
    let (tx, rx) = mpsc::unbounded_channel();
    subscriber
        .register_handler(event, move |n: &Notification| {
            let _ = tx.send(n.clone());
        })
        .await
        .expect("register handler");
    rx
}

/// Следующее уведомление или паника по таймауту.
pub async fn next(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Notification {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for notification")
        .expect("handler dropped")
}

/// Проверяет, что до маркера в канал ничего не пришло.
///
/// Уведомления одного канала доставляются по порядку, поэтому маркер,
/// опубликованный последним, должен прийти первым.
pub async fn assert_quiet(
    publisher: &PublisherClient,
    channel: &str,
    rx: &mut mpsc::UnboundedReceiver<Notification>,
) {
    publisher
        .publish_channel(channel, &["__marker__"])
        .await
        .expect("publish marker");
    let n = next(rx).await;
    assert_eq!(n.field(0), Some("__marker__"), "unexpected notification: {n:?}");
}

/// Адаптер, который перед `exec` изменяет первый наблюдаемый ключ, пока не
/// исчерпан запас конфликтов. Данные при этом остаются прежними, меняется
/// только ревизия ключа.
pub struct ConflictingStore {
    inner: InMemoryStore,
    remaining: AtomicUsize,
    injected: AtomicUsize,
}

impl ConflictingStore {
    pub fn new(
        inner: InMemoryStore,
        conflicts: usize,
    ) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(conflicts),
            injected: AtomicUsize::new(0),
        }
    }

    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Меняет ревизию ключа, не меняя его содержимого.
    async fn disturb(
        &self,
        key: &str,
    ) -> ThoonkResult<()> {
        const PROBE: &str = "\u{1}conflict-probe";
        if self.inner.hset(key, PROBE, "1").await.is_ok() {
            self.inner.hdel(key, PROBE).await?;
        } else if self.inner.zadd(key, 0.0, PROBE).await.is_ok() {
            self.inner.zrem(key, PROBE).await?;
        } else {
            self.inner.sadd(key, PROBE).await?;
            self.inner.srem(key, PROBE).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for ConflictingStore {
    async fn sadd(&self, key: &str, member: &str) -> ThoonkResult<bool> {
        self.inner.sadd(key, member).await
    }

    async fn sismember(&self, key: &str, member: &str) -> ThoonkResult<bool> {
        self.inner.sismember(key, member).await
    }

    async fn smembers(&self, key: &str) -> ThoonkResult<Vec<String>> {
        self.inner.smembers(key).await
    }

    async fn srem(&self, key: &str, member: &str) -> ThoonkResult<bool> {
        self.inner.srem(key, member).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> ThoonkResult<bool> {
        self.inner.hset(key, field, value).await
    }

    async fn hget(&self, key: &str, field: &str) -> ThoonkResult<Option<String>> {
        self.inner.hget(key, field).await
    }

    async fn hgetall(&self, key: &str) -> ThoonkResult<HashMap<String, String>> {
        self.inner.hgetall(key).await
    }

    async fn hdel(&self, key: &str, field: &str) -> ThoonkResult<bool> {
        self.inner.hdel(key, field).await
    }

    async fn hexists(&self, key: &str, field: &str) -> ThoonkResult<bool> {
        self.inner.hexists(key, field).await
    }

    async fn del(&self, key: &str) -> ThoonkResult<bool> {
        self.inner.del(key).await
    }

    async fn get(&self, key: &str) -> ThoonkResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn incr(&self, key: &str) -> ThoonkResult<i64> {
        self.inner.incr(key).await
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> ThoonkResult<bool> {
        self.inner.zadd(key, score, member).await
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> ThoonkResult<Vec<String>> {
        self.inner.zrange(key, start, stop).await
    }

    async fn zrem(&self, key: &str, member: &str) -> ThoonkResult<bool> {
        self.inner.zrem(key, member).await
    }

    async fn watch(&self, keys: &[&str]) -> ThoonkResult<Watch> {
        self.inner.watch(keys).await
    }

    async fn unwatch(&self, watch: Watch) -> ThoonkResult<()> {
        self.inner.unwatch(watch).await
    }

    async fn exec(&self, tx: Transaction) -> ThoonkResult<Option<Vec<Reply>>> {
        let target = tx.watch().and_then(|w| w.keys().first().cloned());
        if let Some(key) = target {
            if self.take_conflict() {
                self.disturb(&key).await?;
                self.injected.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.inner.exec(tx).await
    }

    async fn publish(&self, channel: &str, payload: Bytes) -> ThoonkResult<usize> {
        self.inner.publish(channel, payload).await
    }
}
