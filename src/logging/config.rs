use std::{env, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thoonk_error::{ensure, StatusCode, ThoonkResult};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Формат вывода логов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Настройки логирования.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Базовый уровень: trace, debug, info, warn или error.
    pub level: String,
    pub format: LogFormat,
    /// Дополнительные директивы `EnvFilter`, например `thoonk::feed=debug`.
    pub directives: Vec<String>,
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directives: Vec::new(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
        }
    }
}

impl LoggingConfig {
    /// Применяет `THOONK_LOG_LEVEL` и `THOONK_LOG_FORMAT`, если они заданы.
    ///
    /// Некорректный формат игнорируется, некорректный уровень ловит
    /// [`LoggingConfig::validate`].
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("THOONK_LOG_LEVEL") {
            self.level = level.trim().to_ascii_lowercase();
        }
        if let Ok(format) = env::var("THOONK_LOG_FORMAT") {
            if let Ok(format) = format.parse() {
                self.format = format;
            }
        }
    }

    pub fn validate(&self) -> ThoonkResult<()> {
        ensure!(
            LEVELS.contains(&self.level.as_str()),
            StatusCode::InvalidArgs,
            "unknown log level '{}', expected one of {:?}",
            self.level,
            LEVELS
        );
        Ok(())
    }

    /// Строка директив для `EnvFilter`: уровень и дополнительные директивы.
    pub fn build_filter_directive(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}
