use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use thoonk_error::ThoonkResult;

use super::{Reply, Transaction, Watch};

/// Адаптер хранилища ключ-значение.
///
/// Набор примитивов, на которых построены фиды: множества, хэши, счётчик,
/// отсортированное множество, оптимистичные транзакции и публикация в
/// каналы. Ошибки соединения и типов возвращаются как есть, слой фидов
/// их не повторяет.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Добавляет элемент в множество. `true`, если элемента не было.
    async fn sadd(&self, key: &str, member: &str) -> ThoonkResult<bool>;
    async fn sismember(&self, key: &str, member: &str) -> ThoonkResult<bool>;
    async fn smembers(&self, key: &str) -> ThoonkResult<Vec<String>>;
    async fn srem(&self, key: &str, member: &str) -> ThoonkResult<bool>;

    /// Записывает поле хэша. `true`, если поле новое.
    async fn hset(&self, key: &str, field: &str, value: &str) -> ThoonkResult<bool>;
    async fn hget(&self, key: &str, field: &str) -> ThoonkResult<Option<String>>;
    async fn hgetall(&self, key: &str) -> ThoonkResult<HashMap<String, String>>;
    async fn hdel(&self, key: &str, field: &str) -> ThoonkResult<bool>;
    async fn hexists(&self, key: &str, field: &str) -> ThoonkResult<bool>;

    async fn del(&self, key: &str) -> ThoonkResult<bool>;
    async fn get(&self, key: &str) -> ThoonkResult<Option<String>>;
    async fn incr(&self, key: &str) -> ThoonkResult<i64>;

    async fn zadd(&self, key: &str, score: f64, member: &str) -> ThoonkResult<bool>;
    /// Элементы по рангу `[start, stop]`, отрицательные индексы с конца.
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> ThoonkResult<Vec<String>>;
    async fn zrem(&self, key: &str, member: &str) -> ThoonkResult<bool>;

    /// Регистрирует намерение прочитать ключи (`WATCH`).
    async fn watch(&self, keys: &[&str]) -> ThoonkResult<Watch>;
    /// Снимает наблюдение без исполнения транзакции (`UNWATCH`).
    async fn unwatch(&self, watch: Watch) -> ThoonkResult<()>;
    /// Исполняет транзакцию (`MULTI`/`EXEC`).
    ///
    /// `Ok(None)` означает, что транзакция отменена, потому что наблюдаемый
    /// ключ изменился после `watch`. Ни одна команда при этом не применена.
    async fn exec(&self, tx: Transaction) -> ThoonkResult<Option<Vec<Reply>>>;

    /// Публикует сообщение. Возвращает число получателей.
    async fn publish(&self, channel: &str, payload: Bytes) -> ThoonkResult<usize>;
}
