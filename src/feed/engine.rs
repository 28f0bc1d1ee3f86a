use std::collections::HashMap;

use thoonk_error::{StoreError, ThoonkResult};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{FeedConfig, MAX_LENGTH};
use crate::{
    client::PublisherClient,
    engine::Transaction,
    pubsub::{ensure_field, FeedKeys},
};

/// Дескриптор фида.
///
/// Хранит только имя, имена ключей и клиента-издателя. Создаётся по имени
/// сколько угодно раз, собственных ресурсов не держит.
#[derive(Clone)]
pub struct Feed {
    name: String,
    keys: FeedKeys,
    client: PublisherClient,
}

impl std::fmt::Debug for Feed {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("name", &self.name)
            .field("client_id", &self.client.client_id())
            .finish()
    }
}

impl Feed {
    pub fn new(
        name: &str,
        client: PublisherClient,
    ) -> Self {
        Self {
            name: name.to_string(),
            keys: FeedKeys::new(name),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ids_key(&self) -> &str {
        &self.keys.ids
    }

    pub fn items_key(&self) -> &str {
        &self.keys.items
    }

    pub fn publishes_key(&self) -> &str {
        &self.keys.publishes
    }

    pub fn config_key(&self) -> &str {
        &self.keys.config
    }

    pub fn publish_channel(&self) -> &str {
        &self.keys.publish_channel
    }

    pub fn edit_channel(&self) -> &str {
        &self.keys.edit_channel
    }

    pub fn retract_channel(&self) -> &str {
        &self.keys.retract_channel
    }

    /// Публикует элемент и возвращает его id.
    ///
    /// Без `id` генерируется новый. Существующий id перезаписывается и
    /// становится самым свежим (событие edit вместо publish). При заданном
    /// `max_length = N` после публикации в фиде остаётся не больше N id,
    /// вытесненные получают уведомление retract. Публикуемый id никогда не
    /// вытесняется своей же публикацией.
    #[instrument(skip(self, item, id), fields(feed = %self.name))]
    pub async fn publish(
        &self,
        item: &str,
        id: Option<&str>,
    ) -> ThoonkResult<String> {
        let id = id.map_or_else(new_item_id, str::to_string);
        ensure_field(&id)?;
        ensure_field(item)?;

        let store = self.client.storage();
        let keys = &self.keys;
        let mut attempt = 0;

        loop {
            let watch = store
                .watch(&[keys.config.as_str(), keys.ids.as_str(), keys.items.as_str()])
                .await?;
            let existed = store.hexists(&keys.items, &id).await?;
            let evicted = match parse_max_length(store.hget(&keys.config, MAX_LENGTH).await?) {
                Some(max_length) => {
                    let ids = store.zrange(&keys.ids, 0, -1).await?;
                    eviction_candidates(&ids, &id, max_length)
                }
                None => Vec::new(),
            };

            let mut tx = Transaction::watched(watch);
            for old in &evicted {
                tx.zrem(&keys.ids, old)
                    .hdel(&keys.items, old)
                    .publish(&keys.retract_channel, self.client.encode_notification(&[old])?);
            }
            tx.incr(&keys.publishes)
                .hset(&keys.items, &id, item)
                .zadd(&keys.ids, self.client.next_score(), &id);

            if store.exec(tx).await?.is_some() {
                let channel = if existed {
                    &keys.edit_channel
                } else {
                    &keys.publish_channel
                };
                self.client.publish_channel(channel, &[id.as_str(), item]).await?;
                debug!(id = %id, edited = existed, evicted = evicted.len(), attempt, "item published");
                return Ok(id);
            }

            attempt += 1;
            self.client.retry_or_fail(&self.name, attempt)?;
            tokio::task::yield_now().await;
        }
    }

    /// Удаляет элемент. Отсутствующий id не считается ошибкой.
    #[instrument(skip(self), fields(feed = %self.name))]
    pub async fn retract(
        &self,
        id: &str,
    ) -> ThoonkResult<()> {
        let store = self.client.storage();
        let keys = &self.keys;
        let mut attempt = 0;

        loop {
            let watch = store.watch(&[keys.items.as_str(), keys.ids.as_str()]).await?;
            if !store.hexists(&keys.items, id).await? {
                store.unwatch(watch).await?;
                debug!(id, "retract of unknown id ignored");
                return Ok(());
            }

            let mut tx = Transaction::watched(watch);
            tx.zrem(&keys.ids, id)
                .hdel(&keys.items, id)
                .publish(&keys.retract_channel, self.client.encode_notification(&[id])?);

            if store.exec(tx).await?.is_some() {
                debug!(id, attempt, "item retracted");
                return Ok(());
            }

            attempt += 1;
            self.client.retry_or_fail(&self.name, attempt)?;
            tokio::task::yield_now().await;
        }
    }

    pub async fn get_item(
        &self,
        id: &str,
    ) -> ThoonkResult<Option<String>> {
        self.client.storage().hget(&self.keys.items, id).await
    }

    pub async fn has_id(
        &self,
        id: &str,
    ) -> ThoonkResult<bool> {
        self.client.storage().hexists(&self.keys.items, id).await
    }

    /// Id элементов от самого старого к самому свежему.
    pub async fn get_ids(&self) -> ThoonkResult<Vec<String>> {
        self.client.storage().zrange(&self.keys.ids, 0, -1).await
    }

    pub async fn get_all(&self) -> ThoonkResult<HashMap<String, String>> {
        self.client.storage().hgetall(&self.keys.items).await
    }

    /// Общее число публикаций, включая правки и вытесненные элементы.
    pub async fn get_publish_count(&self) -> ThoonkResult<u64> {
        match self.client.storage().get(&self.keys.publishes).await? {
            None => Ok(0),
            Some(raw) => Ok(raw.parse().map_err(|_| StoreError::InvalidArgument {
                reason: format!("publish counter '{}' is not a number: {raw}", self.keys.publishes),
            })?),
        }
    }

    pub async fn set_config(
        &self,
        config: &FeedConfig,
    ) -> ThoonkResult<()> {
        self.client.set_config(&self.name, config).await
    }

    pub async fn get_config(&self) -> ThoonkResult<FeedConfig> {
        self.client.get_config(&self.name).await
    }
}

/// Новый глобально уникальный id элемента.
pub fn new_item_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Разбирает `max_length`. Отсутствующее, нечисловое или неположительное
/// значение означает отсутствие ограничения.
pub fn parse_max_length(raw: Option<String>) -> Option<usize> {
    raw?.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
}

/// Id, которые надо вытеснить перед публикацией `incoming`.
///
/// `ids` упорядочены от старых к новым. После публикации должно остаться не
/// больше `max_length` id, включая `incoming`, поэтому из остальных
/// сохраняются `max_length - 1` самых свежих.
pub fn eviction_candidates(
    ids: &[String],
    incoming: &str,
    max_length: usize,
) -> Vec<String> {
    let others: Vec<&String> = ids.iter().filter(|id| id.as_str() != incoming).collect();
    let keep = max_length.saturating_sub(1);
    let excess = others.len().saturating_sub(keep);
    others[..excess].iter().map(|id| id.to_string()).collect()
}
