use std::collections::{HashMap, HashSet};

use super::SortedSet;

/// Значение, хранимое по ключу во встроенном хранилище.
///
/// Набор типов ограничен тем, что нужно протоколу фидов: строки (счётчики),
/// множества, хэши и отсортированные множества.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Строка; используется для счётчиков `INCR`.
    Str(String),
    /// Множество уникальных строк.
    Set(HashSet<String>),
    /// Хэш: поле → значение.
    Hash(HashMap<String, String>),
    /// Отсортированное множество с упорядочиванием по score.
    ZSet(SortedSet),
}

impl Value {
    /// Имя типа, как его называет Redis (`TYPE key`).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
            Value::ZSet(_) => "zset",
        }
    }

    /// Пустая коллекция: такой ключ удаляется из keyspace.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Set(s) => s.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::ZSet(z) => z.is_empty(),
        }
    }
}
