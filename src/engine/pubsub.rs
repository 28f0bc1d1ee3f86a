use async_trait::async_trait;
use thoonk_error::ThoonkResult;

/// Сторона подписки адаптера хранилища.
///
/// `subscribe` только отправляет запрос. Подтверждение приходит отдельно
/// через [`PubSubListener::on_subscribed`], после чего сообщения канала
/// доставляются в [`PubSubListener::on_message`].
#[async_trait]
pub trait PubSub: Send + Sync {
    async fn subscribe(&self, channel: &str) -> ThoonkResult<()>;
}

/// Получатель событий подписочного соединения.
///
/// Вызовы для одного канала приходят последовательно: сначала
/// подтверждение, потом сообщения в порядке публикации.
pub trait PubSubListener: Send + Sync {
    fn on_subscribed(&self, channel: &str);
    fn on_message(&self, channel: &str, payload: &[u8]);
}
