use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use super::ClientConfig;
use crate::logging::LoggingConfig;

/// Полные настройки приложения, встраивающего клиент.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем переменные
    /// окружения вида `THOONK_CLIENT__MAX_RETRIES`.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ClientConfig::default();
        let cfg = Config::builder()
            .set_default("client.broker_capacity", defaults.broker_capacity as u64)?
            .set_default("logging.level", "info")?
            .add_source(
                Environment::with_prefix("THOONK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        cfg.try_deserialize()
    }
}
