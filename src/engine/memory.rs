use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use thoonk_error::{StoreError, ThoonkResult};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, warn};

use super::{Command, PubSub, PubSubListener, Reply, Storage, Transaction, Watch};
use crate::{
    database::{SortedSet, Value},
    pubsub::Broker,
};

/// Ёмкость канала брокера по умолчанию.
pub const DEFAULT_BROKER_CAPACITY: usize = 1024;

/// Данные, ревизии ключей и глобальный счётчик ревизий.
///
/// Ревизия ключа меняется только при реальном изменении значения.
/// Опустевшие коллекции удаляются, как в Redis.
#[derive(Default)]
struct Keyspace {
    data: HashMap<String, Value>,
    revisions: HashMap<String, u64>,
    revision: u64,
}

fn wrong_type(
    key: &str,
    expected: &'static str,
) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

impl Keyspace {
    fn revision_of(
        &self,
        key: &str,
    ) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    fn touch(
        &mut self,
        key: &str,
    ) {
        self.revision += 1;
        self.revisions.insert(key.to_string(), self.revision);
    }

    fn prune(
        &mut self,
        key: &str,
    ) {
        if self.data.get(key).is_some_and(Value::is_empty_collection) {
            self.data.remove(key);
        }
    }

    /// Проверяет, что ключ отсутствует или хранит значение нужного типа.
    fn check_type(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<(), StoreError> {
        match self.data.get(key) {
            Some(value) if value.type_name() != expected => Err(wrong_type(key, expected)),
            _ => Ok(()),
        }
    }

    fn set(
        &self,
        key: &str,
    ) -> Result<Option<&HashSet<String>>, StoreError> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(Some(set)),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    fn hash(
        &self,
        key: &str,
    ) -> Result<Option<&HashMap<String, String>>, StoreError> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(wrong_type(key, "hash")),
        }
    }

    fn zset(
        &self,
        key: &str,
    ) -> Result<Option<&SortedSet>, StoreError> {
        match self.data.get(key) {
            None => Ok(None),
            Some(Value::ZSet(zset)) => Ok(Some(zset)),
            Some(_) => Err(wrong_type(key, "zset")),
        }
    }

    fn sadd(
        &mut self,
        key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        self.check_type(key, "set")?;
        let added = match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()))
        {
            Value::Set(set) => set.insert(member.to_string()),
            _ => return Err(wrong_type(key, "set")),
        };
        if added {
            self.touch(key);
        }
        Ok(added)
    }

    fn srem(
        &mut self,
        key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let removed = match self.data.get_mut(key) {
            None => false,
            Some(Value::Set(set)) => set.remove(member),
            Some(_) => return Err(wrong_type(key, "set")),
        };
        if removed {
            self.touch(key);
            self.prune(key);
        }
        Ok(removed)
    }

    fn hset(
        &mut self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.check_type(key, "hash")?;
        let added = match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(hash) => hash.insert(field.to_string(), value.to_string()).is_none(),
            _ => return Err(wrong_type(key, "hash")),
        };
        self.touch(key);
        Ok(added)
    }

    fn hdel(
        &mut self,
        key: &str,
        field: &str,
    ) -> Result<bool, StoreError> {
        let removed = match self.data.get_mut(key) {
            None => false,
            Some(Value::Hash(hash)) => hash.remove(field).is_some(),
            Some(_) => return Err(wrong_type(key, "hash")),
        };
        if removed {
            self.touch(key);
            self.prune(key);
        }
        Ok(removed)
    }

    fn del(
        &mut self,
        key: &str,
    ) -> bool {
        let existed = self.data.remove(key).is_some();
        if existed {
            self.touch(key);
        }
        existed
    }

    fn incr(
        &mut self,
        key: &str,
    ) -> Result<i64, StoreError> {
        let current = match self.data.get(key) {
            None => 0,
            Some(Value::Str(s)) => s.parse::<i64>().map_err(|_| StoreError::InvalidArgument {
                reason: format!("value of '{key}' is not an integer"),
            })?,
            Some(_) => return Err(wrong_type(key, "string")),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidArgument {
                reason: format!("increment of '{key}' would overflow"),
            })?;
        self.data.insert(key.to_string(), Value::Str(next.to_string()));
        self.touch(key);
        Ok(next)
    }

    fn zadd(
        &mut self,
        key: &str,
        score: f64,
        member: &str,
    ) -> Result<bool, StoreError> {
        self.check_type(key, "zset")?;
        let added = match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::ZSet(SortedSet::new()))
        {
            Value::ZSet(zset) => zset.insert(member, score),
            _ => return Err(wrong_type(key, "zset")),
        };
        self.touch(key);
        Ok(added)
    }

    fn zrem(
        &mut self,
        key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let removed = match self.data.get_mut(key) {
            None => false,
            Some(Value::ZSet(zset)) => zset.remove(member),
            Some(_) => return Err(wrong_type(key, "zset")),
        };
        if removed {
            self.touch(key);
            self.prune(key);
        }
        Ok(removed)
    }

    /// Проверяет типы ключей всех команд до применения транзакции.
    fn validate(
        &self,
        commands: &[Command],
    ) -> Result<(), StoreError> {
        for command in commands {
            match command {
                Command::SRem { key, .. } => self.check_type(key, "set")?,
                Command::HSet { key, .. } | Command::HDel { key, .. } => {
                    self.check_type(key, "hash")?
                }
                Command::ZAdd { key, .. } | Command::ZRem { key, .. } => {
                    self.check_type(key, "zset")?
                }
                Command::Incr { key } => self.check_type(key, "string")?,
                Command::Del { .. } | Command::Publish { .. } => {}
            }
        }
        Ok(())
    }

    fn apply(
        &mut self,
        command: Command,
        broker: &Broker,
    ) -> Result<Reply, StoreError> {
        let reply = match command {
            Command::SRem { key, member } => Reply::Bool(self.srem(&key, &member)?),
            Command::Del { key } => Reply::Bool(self.del(&key)),
            Command::HSet { key, field, value } => Reply::Bool(self.hset(&key, &field, &value)?),
            Command::HDel { key, field } => Reply::Bool(self.hdel(&key, &field)?),
            Command::Incr { key } => Reply::Integer(self.incr(&key)?),
            Command::ZAdd { key, score, member } => {
                Reply::Bool(self.zadd(&key, score, &member)?)
            }
            Command::ZRem { key, member } => Reply::Bool(self.zrem(&key, &member)?),
            Command::Publish { channel, payload } => {
                Reply::Integer(broker.publish(&channel, payload) as i64)
            }
        };
        Ok(reply)
    }
}

/// Адаптер хранилища, целиком живущий в памяти процесса.
///
/// Клоны разделяют одно пространство ключей и один брокер, поэтому
/// издатель и подписчик, созданные из клонов, видят друг друга.
#[derive(Clone)]
pub struct InMemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
    broker: Arc<Broker>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BROKER_CAPACITY)
    }

    /// Создаёт хранилище с заданной ёмкостью каналов брокера.
    pub fn with_capacity(broker_capacity: usize) -> Self {
        Self {
            keyspace: Arc::new(Mutex::new(Keyspace::default())),
            broker: Arc::new(Broker::new(broker_capacity)),
        }
    }

    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Открывает подписочное соединение с заданным получателем событий.
    pub fn pubsub(
        &self,
        listener: Arc<dyn PubSubListener>,
    ) -> MemoryPubSub {
        MemoryPubSub {
            broker: self.broker.clone(),
            listener,
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn sadd(
        &self,
        key: &str,
        member: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().sadd(key, member)?)
    }

    async fn sismember(
        &self,
        key: &str,
        member: &str,
    ) -> ThoonkResult<bool> {
        let ks = self.keyspace.lock();
        Ok(ks.set(key)?.is_some_and(|set| set.contains(member)))
    }

    async fn smembers(
        &self,
        key: &str,
    ) -> ThoonkResult<Vec<String>> {
        let ks = self.keyspace.lock();
        let mut members: Vec<String> = ks
            .set(key)?
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    async fn srem(
        &self,
        key: &str,
        member: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().srem(key, member)?)
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().hset(key, field, value)?)
    }

    async fn hget(
        &self,
        key: &str,
        field: &str,
    ) -> ThoonkResult<Option<String>> {
        let ks = self.keyspace.lock();
        Ok(ks.hash(key)?.and_then(|hash| hash.get(field).cloned()))
    }

    async fn hgetall(
        &self,
        key: &str,
    ) -> ThoonkResult<HashMap<String, String>> {
        let ks = self.keyspace.lock();
        Ok(ks.hash(key)?.cloned().unwrap_or_default())
    }

    async fn hdel(
        &self,
        key: &str,
        field: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().hdel(key, field)?)
    }

    async fn hexists(
        &self,
        key: &str,
        field: &str,
    ) -> ThoonkResult<bool> {
        let ks = self.keyspace.lock();
        Ok(ks.hash(key)?.is_some_and(|hash| hash.contains_key(field)))
    }

    async fn del(
        &self,
        key: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().del(key))
    }

    async fn get(
        &self,
        key: &str,
    ) -> ThoonkResult<Option<String>> {
        let ks = self.keyspace.lock();
        match ks.data.get(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type(key, "string").into()),
        }
    }

    async fn incr(
        &self,
        key: &str,
    ) -> ThoonkResult<i64> {
        Ok(self.keyspace.lock().incr(key)?)
    }

    async fn zadd(
        &self,
        key: &str,
        score: f64,
        member: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().zadd(key, score, member)?)
    }

    async fn zrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> ThoonkResult<Vec<String>> {
        let ks = self.keyspace.lock();
        Ok(ks
            .zset(key)?
            .map(|zset| zset.range_by_rank(start, stop))
            .unwrap_or_default())
    }

    async fn zrem(
        &self,
        key: &str,
        member: &str,
    ) -> ThoonkResult<bool> {
        Ok(self.keyspace.lock().zrem(key, member)?)
    }

    async fn watch(
        &self,
        keys: &[&str],
    ) -> ThoonkResult<Watch> {
        let ks = self.keyspace.lock();
        let revisions = keys.iter().map(|key| ks.revision_of(key)).collect();
        Ok(Watch::new(
            keys.iter().map(|key| key.to_string()).collect(),
            revisions,
        ))
    }

    async fn unwatch(
        &self,
        _watch: Watch,
    ) -> ThoonkResult<()> {
        Ok(())
    }

    async fn exec(
        &self,
        tx: Transaction,
    ) -> ThoonkResult<Option<Vec<Reply>>> {
        let (watch, commands) = tx.into_parts();
        let mut ks = self.keyspace.lock();

        if let Some(watch) = &watch {
            if let Some((key, _)) = watch
                .entries()
                .find(|(key, revision)| ks.revision_of(key) != *revision)
            {
                debug!(key, "transaction aborted, watched key changed");
                return Ok(None);
            }
        }

        ks.validate(&commands)?;
        let mut replies = Vec::with_capacity(commands.len());
        for command in commands {
            replies.push(ks.apply(command, &self.broker)?);
        }
        Ok(Some(replies))
    }

    async fn publish(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> ThoonkResult<usize> {
        Ok(self.broker.publish(channel, payload))
    }
}

/// Подписочное соединение к [`InMemoryStore`].
///
/// На каждый канал запускается задача, которая подтверждает подписку и
/// затем пересылает сообщения брокера получателю. Задачи останавливаются
/// при удалении соединения.
pub struct MemoryPubSub {
    broker: Arc<Broker>,
    listener: Arc<dyn PubSubListener>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl MemoryPubSub {
    /// Каналы, на которые открыта подписка.
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.tasks.lock().keys().cloned().collect();
        channels.sort();
        channels
    }
}

#[async_trait]
impl PubSub for MemoryPubSub {
    async fn subscribe(
        &self,
        channel: &str,
    ) -> ThoonkResult<()> {
        let listener = self.listener.clone();
        let name = channel.to_string();
        let mut tasks = self.tasks.lock();

        if tasks.contains_key(channel) {
            tokio::spawn(async move { listener.on_subscribed(&name) });
            return Ok(());
        }

        // Подписка на брокер создаётся до возврата, чтобы не потерять
        // сообщения, опубликованные сразу после subscribe.
        let mut sub = self.broker.subscribe(channel);
        let handle = tokio::spawn(async move {
            listener.on_subscribed(&name);
            loop {
                match sub.recv().await {
                    Ok(msg) => listener.on_message(&msg.channel, &msg.payload),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(channel = %name, skipped, "subscriber lagged, notifications lost");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        tasks.insert(channel.to_string(), handle);
        debug!(channel, "subscribed");
        Ok(())
    }
}

impl Drop for MemoryPubSub {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}
