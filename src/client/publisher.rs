use std::sync::Arc;

use bytes::Bytes;
use thoonk_error::{FeedError, ResultExt, ThoonkResult};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::ScoreClock;
use crate::{
    config::ClientConfig,
    engine::{Storage, Transaction},
    feed::{Feed, FeedConfig},
    pubsub::{
        config_key, encode_fields, ensure_field, FeedKeys, DEL_FEED_CHANNEL, FEEDS_KEY,
        NEW_FEED_CHANNEL,
    },
};

struct Inner {
    storage: Arc<dyn Storage>,
    client_id: String,
    config: ClientConfig,
    clock: ScoreClock,
}

/// Клиент-издатель: жизненный цикл фидов и публикация в каналы.
///
/// Клонирование дешёвое, клоны разделяют хранилище, идентификатор клиента и
/// часы score.
#[derive(Clone)]
pub struct PublisherClient {
    inner: Arc<Inner>,
}

impl PublisherClient {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_config(storage, ClientConfig::default())
    }

    pub fn with_config(
        storage: Arc<dyn Storage>,
        config: ClientConfig,
    ) -> Self {
        let client_id = Uuid::new_v4().simple().to_string();
        debug!(client_id = %client_id, "publisher client created");
        Self {
            inner: Arc::new(Inner {
                storage,
                client_id,
                config,
                clock: ScoreClock::new(),
            }),
        }
    }

    /// Идентификатор экземпляра, последнее поле каждого уведомления.
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Регистрирует фид, оповещает канал создания и применяет конфигурацию.
    ///
    /// Уже зарегистрированное имя даёт `FeedError::FeedExists`.
    #[instrument(skip(self, config))]
    pub async fn create_feed(
        &self,
        name: &str,
        config: &FeedConfig,
    ) -> ThoonkResult<()> {
        ensure_field(name)?;
        let store = self.storage();

        if !store.sadd(FEEDS_KEY, name).await? {
            return Err(FeedError::FeedExists {
                feed: name.to_string(),
            }
            .into());
        }
        self.publish_channel(NEW_FEED_CHANNEL, &[name]).await?;

        let key = config_key(name);
        for (field, value) in config {
            store
                .hset(&key, field, value)
                .await
                .with_context(|| format!("failed to write config field '{field}' of feed '{name}'"))?;
        }
        info!(feed = name, "feed created");
        Ok(())
    }

    /// Удаляет фид со всеми его данными и оповещает канал удаления.
    ///
    /// Незарегистрированное имя даёт `FeedError::FeedDoesNotExist`.
    #[instrument(skip(self))]
    pub async fn delete_feed(
        &self,
        name: &str,
    ) -> ThoonkResult<()> {
        let store = self.storage();
        let keys = FeedKeys::new(name);
        let mut attempt = 0;

        loop {
            let watch = store.watch(&[FEEDS_KEY, keys.config.as_str()]).await?;
            if !store.sismember(FEEDS_KEY, name).await? {
                store.unwatch(watch).await?;
                return Err(feed_does_not_exist(name));
            }

            let mut tx = Transaction::watched(watch);
            tx.srem(FEEDS_KEY, name)
                .del(&keys.config)
                .del(&keys.ids)
                .del(&keys.items)
                .del(&keys.publishes)
                .publish(DEL_FEED_CHANNEL, self.encode_notification(&[name])?);

            if let Some(replies) = store.exec(tx).await? {
                if !replies.first().is_some_and(|r| r.as_bool()) {
                    return Err(feed_does_not_exist(name));
                }
                info!(feed = name, attempt, "feed deleted");
                return Ok(());
            }

            attempt += 1;
            self.retry_or_fail(name, attempt)?;
            tokio::task::yield_now().await;
        }
    }

    pub async fn feed_exists(
        &self,
        name: &str,
    ) -> ThoonkResult<bool> {
        self.storage().sismember(FEEDS_KEY, name).await
    }

    /// Объединяет поля с текущей конфигурацией фида. Каждое поле пишется
    /// отдельно, атомарности для набора нет.
    pub async fn set_config(
        &self,
        name: &str,
        config: &FeedConfig,
    ) -> ThoonkResult<()> {
        self.require_feed(name).await?;
        let key = config_key(name);
        for (field, value) in config {
            self.storage()
                .hset(&key, field, value)
                .await
                .with_context(|| format!("failed to write config field '{field}' of feed '{name}'"))?;
        }
        debug!(feed = name, fields = config.len(), "feed config updated");
        Ok(())
    }

    pub async fn get_config(
        &self,
        name: &str,
    ) -> ThoonkResult<FeedConfig> {
        self.require_feed(name).await?;
        self.storage().hgetall(&config_key(name)).await
    }

    /// Имена всех зарегистрированных фидов.
    pub async fn get_feed_names(&self) -> ThoonkResult<Vec<String>> {
        self.storage().smembers(FEEDS_KEY).await
    }

    /// Дескриптор фида. Незарегистрированный фид сначала создаётся.
    pub async fn feed(
        &self,
        name: &str,
    ) -> ThoonkResult<Feed> {
        if !self.feed_exists(name).await? {
            match self.create_feed(name, &FeedConfig::new()).await {
                Ok(()) => {}
                Err(e) if matches!(e.downcast_ref::<FeedError>(), Some(FeedError::FeedExists { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Feed::new(name, self.clone()))
    }

    /// Публикует поля в канал, добавив идентификатор клиента последним полем.
    ///
    /// Возвращает число получателей по данным хранилища.
    pub async fn publish_channel<S: AsRef<str>>(
        &self,
        channel: &str,
        fields: &[S],
    ) -> ThoonkResult<usize> {
        let payload = self.encode_notification(fields)?;
        self.storage().publish(channel, payload).await
    }

    pub(crate) fn encode_notification<S: AsRef<str>>(
        &self,
        fields: &[S],
    ) -> ThoonkResult<Bytes> {
        let all: Vec<&str> = fields
            .iter()
            .map(|f| AsRef::<str>::as_ref(f))
            .chain(std::iter::once(self.client_id()))
            .collect();
        encode_fields(&all)
    }

    pub(crate) fn next_score(&self) -> f64 {
        self.inner.clock.next()
    }

    /// Решает судьбу транзакции, отменённой `attempt`-й раз подряд.
    pub(crate) fn retry_or_fail(
        &self,
        feed: &str,
        attempt: u32,
    ) -> ThoonkResult<()> {
        if !self.inner.config.allows_retry(attempt) {
            return Err(FeedError::ConflictExhausted {
                feed: feed.to_string(),
                attempts: attempt,
            }
            .into());
        }
        debug!(feed, attempt, "transaction conflict, retrying");
        Ok(())
    }

    async fn require_feed(
        &self,
        name: &str,
    ) -> ThoonkResult<()> {
        if self.feed_exists(name).await? {
            Ok(())
        } else {
            Err(feed_does_not_exist(name))
        }
    }
}

fn feed_does_not_exist(name: &str) -> thoonk_error::StackError {
    FeedError::FeedDoesNotExist {
        feed: name.to_string(),
    }
    .into()
}
