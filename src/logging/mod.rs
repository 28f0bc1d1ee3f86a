//! Инициализация `tracing` для приложений, встраивающих клиент.
//!
//! Библиотека только пишет события через `tracing`; подписчик ставит
//! приложение, обычно через [`init_logging`].

pub mod config;
mod filters;
mod formatter;

pub use config::{LogFormat, LoggingConfig};
use thoonk_error::{bail, StatusCode, ThoonkResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Устанавливает глобальный подписчик `tracing` по конфигурации.
///
/// Перед установкой применяются переопределения из окружения и проверяется
/// уровень. Повторный вызов возвращает ошибку, а не паникует.
pub fn init_logging(mut config: LoggingConfig) -> ThoonkResult<()> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config);
    let fmt_layer = formatter::build_formatter_from_config(&config);

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        bail!(StatusCode::Internal, "failed to install tracing subscriber: {}", e);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        log_format = %config.format,
        "Logging system initialized"
    );
    Ok(())
}
