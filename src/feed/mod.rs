//! Фиды: упорядоченные ограниченные коллекции элементов в хранилище.
//!
//! - `engine`: протокол publish/retract поверх оптимистичных транзакций.
//! - `event`: типизированный разбор уведомлений фидов.

use std::collections::HashMap;

pub mod engine;
pub mod event;

pub use engine::*;
pub use event::*;

/// Конфигурация фида: плоское отображение ключ → строковое значение.
pub type FeedConfig = HashMap<String, String>;

/// Ключ конфигурации, ограничивающий число хранимых id.
pub const MAX_LENGTH: &str = "max_length";
