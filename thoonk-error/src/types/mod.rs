pub mod feed;
pub mod pubsub;
pub mod store;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use feed::*;
pub use pubsub::*;
pub use store::*;

use crate::{ErrorExt, StatusCode};

/// Универсальная ошибка с кодом и сообщением.
#[derive(Debug, Clone)]
pub struct GenericError {
    code: StatusCode,
    message: String,
}

impl GenericError {
    pub fn new(
        code: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GenericError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GenericError {}

impl ErrorExt for GenericError {
    fn status_code(&self) -> StatusCode {
        self.code
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Конвертация из std::io::Error (ошибки транспорта адаптера хранилища).
impl From<std::io::Error> for crate::StackError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => StatusCode::ConnectionFailed,
            std::io::ErrorKind::TimedOut => StatusCode::Timeout,
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::BrokenPipe => {
                StatusCode::ConnectionClosed
            }
            _ => StatusCode::Io,
        };
        crate::StackError::new(GenericError::new(code, err.to_string()))
    }
}

/// Конвертация из std::string::FromUtf8Error (payload уведомления не UTF-8).
impl From<std::string::FromUtf8Error> for crate::StackError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        crate::StackError::new(GenericError::new(
            StatusCode::InvalidUtf8,
            format!("UTF-8 conversion failed: {err}"),
        ))
    }
}
