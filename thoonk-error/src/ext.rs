use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок клиента фидов (object-safe).
///
/// Любая ошибка, которая может оказаться внутри [`StackError`](crate::StackError),
/// реализует этот трейт: он даёт статус-код, доступ к конкретному типу через
/// `as_any` и строку для логов.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус ошибки. По умолчанию [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`], чтобы можно было выполнить downcast.
    fn as_any(&self) -> &dyn Any;

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Короткое имя типа ошибки (без пути модулей).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}
