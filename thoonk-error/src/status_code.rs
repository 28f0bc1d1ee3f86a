use std::fmt;

use num_enum::TryFromPrimitive;

/// Коды статуса для категоризации ошибок клиента фидов.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки данных (фиды, ключи, конфликты)
/// - 5xxx: Хранилище
/// - 6xxx: Сеть / соединение
/// - 8xxx: Протокол pub/sub
///
/// `num_enum::TryFromPrimitive` даёт `TryFrom<u32>`, что удобно, когда код
/// приходит извне (например, из логов или метрик).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,
    NotImplemented = 1005,

    // === 2xxx: Ошибки данных ===
    NotFound = 2000,
    AlreadyExists = 2001,
    WrongType = 2007,
    InvalidValue = 2004,
    Conflict = 2010,

    // === 5xxx: Хранилище ===
    StorageUnavailable = 5000,
    RetryExhausted = 5008,

    // === 6xxx: Сеть/IO ===
    Io = 6000,
    ConnectionClosed = 6001,
    Timeout = 6002,
    ConnectionFailed = 6004,

    // === 8xxx: Протокол ===
    ProtocolError = 8003,
    InvalidUtf8 = 8004,
    SubscribeFailed = 8012,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Имеет ли смысл повторять операцию, завершившуюся с этим кодом.
    ///
    /// `Conflict` сюда входит: конфликт оптимистичной транзакции всегда
    /// разрешается повтором всей логической операции.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict
                | Self::Timeout
                | Self::StorageUnavailable
                | Self::ConnectionFailed
        )
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка на стороне вызывающего кода: неверный запрос или данные.
    pub fn is_client_error(&self) -> bool {
        let c = self.code();
        if (2000..=4999).contains(&c) {
            return true;
        }
        matches!(self, Self::InvalidArgs)
    }

    /// Внутренняя или инфраструктурная ошибка.
    pub fn is_server_error(&self) -> bool {
        let c = self.code();
        matches!(c, 1000..=1999 | 5000..=7999) && !matches!(self, Self::InvalidArgs)
    }

    /// Ошибка протокола pub/sub (диапазон 8xxx).
    pub fn is_protocol_error(&self) -> bool {
        (8000..=8999).contains(&self.code())
    }

    /// Требуется ли логировать как критическую ошибку.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Internal | Self::StorageUnavailable)
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::NotFound | Self::AlreadyExists | Self::Conflict => LogLevel::Debug,
            Self::InvalidArgs | Self::InvalidValue | Self::WrongType => LogLevel::Info,
            Self::Timeout | Self::ConnectionClosed | Self::RetryExhausted => LogLevel::Warn,
            Self::Internal | Self::StorageUnavailable => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
