use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_BROKER_CAPACITY;

/// Настройки клиента фидов.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Предел повторов транзакции при конфликте.
    ///
    /// `None` повторяет бесконечно. `Some(n)` допускает `n` повторов и
    /// возвращает `FeedError::ConflictExhausted` на `n + 1`-й отмене.
    pub max_retries: Option<u32>,
    /// Ёмкость каналов брокера [`InMemoryStore`](crate::engine::InMemoryStore).
    pub broker_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            broker_capacity: DEFAULT_BROKER_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn with_max_retries(
        mut self,
        max_retries: u32,
    ) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Разрешён ли ещё один повтор после `attempt` отменённых попыток.
    pub fn allows_retry(
        &self,
        attempt: u32,
    ) -> bool {
        match self.max_retries {
            Some(max) => attempt <= max,
            None => true,
        }
    }
}
