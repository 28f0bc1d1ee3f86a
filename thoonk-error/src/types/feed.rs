use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки жизненного цикла и протокола фидов.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// `create_feed` на уже зарегистрированное имя.
    #[error("Feed already exists: {feed}")]
    FeedExists { feed: String },

    /// Операция над незарегистрированным фидом.
    #[error("Feed does not exist: {feed}")]
    FeedDoesNotExist { feed: String },

    /// Поле уведомления содержит зарезервированный байт-разделитель.
    #[error("Field contains the reserved separator byte: {field:?}")]
    InvalidField { field: String },

    /// Исчерпан лимит повторов при конфликте транзакции.
    ///
    /// Возникает только если в `ClientConfig` задан `max_retries`.
    #[error("Transaction on feed '{feed}' kept conflicting after {attempts} attempts")]
    ConflictExhausted { feed: String, attempts: u32 },
}

impl FeedError {
    /// Имя фида, к которому относится ошибка (если есть).
    pub fn feed(&self) -> Option<&str> {
        match self {
            Self::FeedExists { feed }
            | Self::FeedDoesNotExist { feed }
            | Self::ConflictExhausted { feed, .. } => Some(feed),
            Self::InvalidField { .. } => None,
        }
    }
}

impl ErrorExt for FeedError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::FeedExists { .. } => StatusCode::AlreadyExists,
            Self::FeedDoesNotExist { .. } => StatusCode::NotFound,
            Self::InvalidField { .. } => StatusCode::InvalidArgs,
            Self::ConflictExhausted { .. } => StatusCode::RetryExhausted,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
