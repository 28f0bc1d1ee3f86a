use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки адаптера хранилища.
///
/// Слой фидов пробрасывает их вызывающему коду без изменений и никогда не
/// повторяет операцию сам.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Не удалось установить или использовать соединение.
    #[error("Connection error: {reason}")]
    Connection { reason: String },

    /// Соединение закрыто.
    #[error("Connection closed")]
    Closed,

    /// Ключ хранит значение другого типа.
    #[error("Wrong type for key '{key}': expected {expected}")]
    WrongType { key: String, expected: &'static str },

    /// Некорректный аргумент команды (например, нечисловое значение для INCR).
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Внутренняя ошибка адаптера.
    #[error("Internal store error: {reason}")]
    Internal { reason: String },
}

impl ErrorExt for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Connection { .. } => StatusCode::ConnectionFailed,
            Self::Closed => StatusCode::ConnectionClosed,
            Self::WrongType { .. } => StatusCode::WrongType,
            Self::InvalidArgument { .. } => StatusCode::InvalidValue,
            Self::Internal { .. } => StatusCode::Internal,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
