use std::sync::Arc;

use bytes::Bytes;

use crate::feed::FeedEvent;

/// Сырое сообщение брокера: канал и байтовый payload.
#[derive(Debug, Clone)]
pub struct Message {
    pub channel: Arc<str>,
    pub payload: Bytes,
}

impl Message {
    pub fn new(
        channel: impl Into<Arc<str>>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Декодированное уведомление, которое получают обработчики подписчика.
///
/// `fields` содержит позиционные поля payload'а в исходном порядке. Последнее поле
/// уведомлений, отправленных `PublisherClient`, всегда идентификатор клиента.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub fields: Vec<String>,
}

impl Notification {
    pub fn new(
        channel: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            fields,
        }
    }

    /// Поле по позиции.
    pub fn field(
        &self,
        index: usize,
    ) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Типизированное событие фида, если канал принадлежит фиду.
    pub fn event(&self) -> Option<FeedEvent> {
        FeedEvent::decode(&self.channel, &self.fields)
    }
}
