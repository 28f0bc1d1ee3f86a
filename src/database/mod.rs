//! Структуры данных встроенного хранилища.
//!
//! - `sorted_set`: отсортированное множество (ZSET) с выборкой по рангу.
//! - `types`: `Value`, значение по ключу в keyspace.

pub mod sorted_set;
pub mod types;

pub use sorted_set::*;
pub use types::*;
