use bytes::Bytes;

/// Отметка оптимистичной транзакции (аналог `WATCH`).
///
/// Хранит ключи и ревизии, которые адаптер видел в момент `watch`.
/// Адаптеры, у которых WATCH привязан к соединению, могут оставлять ревизии
/// пустыми и проверять конфликт на своей стороне.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watch {
    keys: Vec<String>,
    revisions: Vec<u64>,
}

impl Watch {
    pub fn new(
        keys: Vec<String>,
        revisions: Vec<u64>,
    ) -> Self {
        Self { keys, revisions }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Пары (ключ, ревизия на момент `watch`).
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.revisions.iter().copied())
    }
}

/// Команда, поставленная в очередь транзакции (`MULTI`).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SRem { key: String, member: String },
    Del { key: String },
    HSet { key: String, field: String, value: String },
    HDel { key: String, field: String },
    Incr { key: String },
    ZAdd { key: String, score: f64, member: String },
    ZRem { key: String, member: String },
    Publish { channel: String, payload: Bytes },
}

impl Command {
    /// Имя команды в нотации Redis.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SRem { .. } => "srem",
            Command::Del { .. } => "del",
            Command::HSet { .. } => "hset",
            Command::HDel { .. } => "hdel",
            Command::Incr { .. } => "incr",
            Command::ZAdd { .. } => "zadd",
            Command::ZRem { .. } => "zrem",
            Command::Publish { .. } => "publish",
        }
    }
}

/// Ответ на одну команду транзакции.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Изменила ли команда данные (добавлен/удалён элемент, удалён ключ).
    Bool(bool),
    /// Числовой ответ: новое значение счётчика или число получателей.
    Integer(i64),
}

impl Reply {
    pub fn as_bool(&self) -> bool {
        match self {
            Reply::Bool(b) => *b,
            Reply::Integer(n) => *n != 0,
        }
    }

    pub fn as_integer(&self) -> i64 {
        match self {
            Reply::Bool(b) => i64::from(*b),
            Reply::Integer(n) => *n,
        }
    }
}

/// Очередь команд, исполняемая атомарно через [`Storage::exec`].
///
/// Если транзакция создана через [`Transaction::watched`], адаптер
/// отменяет её целиком, когда хоть один наблюдаемый ключ изменился после
/// `watch`.
///
/// [`Storage::exec`]: super::Storage::exec
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    watch: Option<Watch>,
    commands: Vec<Command>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(watch: Watch) -> Self {
        Self {
            watch: Some(watch),
            commands: Vec::new(),
        }
    }

    pub fn watch(&self) -> Option<&Watch> {
        self.watch.as_ref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn into_parts(self) -> (Option<Watch>, Vec<Command>) {
        (self.watch, self.commands)
    }

    pub fn srem(
        &mut self,
        key: &str,
        member: &str,
    ) -> &mut Self {
        self.push(Command::SRem {
            key: key.to_string(),
            member: member.to_string(),
        })
    }

    pub fn del(
        &mut self,
        key: &str,
    ) -> &mut Self {
        self.push(Command::Del {
            key: key.to_string(),
        })
    }

    pub fn hset(
        &mut self,
        key: &str,
        field: &str,
        value: &str,
    ) -> &mut Self {
        self.push(Command::HSet {
            key: key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    pub fn hdel(
        &mut self,
        key: &str,
        field: &str,
    ) -> &mut Self {
        self.push(Command::HDel {
            key: key.to_string(),
            field: field.to_string(),
        })
    }

    pub fn incr(
        &mut self,
        key: &str,
    ) -> &mut Self {
        self.push(Command::Incr {
            key: key.to_string(),
        })
    }

    pub fn zadd(
        &mut self,
        key: &str,
        score: f64,
        member: &str,
    ) -> &mut Self {
        self.push(Command::ZAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        })
    }

    pub fn zrem(
        &mut self,
        key: &str,
        member: &str,
    ) -> &mut Self {
        self.push(Command::ZRem {
            key: key.to_string(),
            member: member.to_string(),
        })
    }

    pub fn publish(
        &mut self,
        channel: &str,
        payload: Bytes,
    ) -> &mut Self {
        self.push(Command::Publish {
            channel: channel.to_string(),
            payload,
        })
    }

    fn push(
        &mut self,
        command: Command,
    ) -> &mut Self {
        self.commands.push(command);
        self
    }
}
