use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки подписки на каналы.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    /// Адаптер отклонил запрос на подписку.
    ///
    /// Все регистрации, ожидавшие этот канал, завершаются этой ошибкой,
    /// а канал возвращается в состояние `Unsubscribed`.
    #[error("Subscribe to '{channel}' failed: {reason}")]
    SubscribeFailed { channel: String, reason: String },

    /// Подписчик уничтожен, пока регистрация ждала подтверждения.
    #[error("Subscriber was dropped before the subscription completed")]
    DispatcherGone,
}

impl ErrorExt for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SubscribeFailed { .. } => StatusCode::SubscribeFailed,
            Self::DispatcherGone => StatusCode::ConnectionClosed,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
