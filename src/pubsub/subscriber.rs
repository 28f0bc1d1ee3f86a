use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use super::Message;

/// Подписка брокера на конкретный канал.
///
/// Отписка происходит автоматически при `Drop`.
pub struct Subscription {
    /// Название канала, на который подписаны.
    pub channel: Arc<str>,
    /// Внутренний приёмник для входящих сообщений.
    pub(crate) inner: broadcast::Receiver<Message>,
}

impl Subscription {
    /// Асинхронно ожидает следующее сообщение из канала.
    ///
    /// # Возвращает
    /// - `Ok(Message)` при успешном получении сообщения
    /// - `Err(RecvError::Closed)` если канал закрыт
    /// - `Err(RecvError::Lagged(n))` если приёмник отстал на `n` сообщений
    pub async fn recv(&mut self) -> Result<Message, RecvError> {
        self.inner.recv().await
    }

    /// Пытается получить сообщение без ожидания.
    pub fn try_recv(&mut self) -> Result<Message, TryRecvError> {
        self.inner.try_recv()
    }

    /// Возвращает имя канала, на который подписались.
    pub fn channel_name(&self) -> &Arc<str> {
        &self.channel
    }

    /// Количество сообщений в очереди на получение.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
