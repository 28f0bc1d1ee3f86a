use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::{Message, Subscription};

type ChannelKey = Arc<str>;

/// Внутрипроцессный брокер Pub/Sub сообщений.
///
/// Поддерживает только точные подписки по имени канала. Каналы без
/// слушателей удаляются при следующей публикации.
pub struct Broker {
    /// Точные каналы → `Sender`
    channels: Arc<DashMap<ChannelKey, broadcast::Sender<Message>>>,
    /// Ёмкость буфера каждого `broadcast::channel`
    default_capacity: usize,
    /// Общее количество вызовов `publish`
    pub publish_count: AtomicUsize,
    /// Количество неудачных `send` (нет подписчиков)
    pub send_error_count: AtomicUsize,
}

impl Broker {
    /// Создаёт новый `Broker` с заданной буферной ёмкостью.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            default_capacity: default_capacity.max(1),
            publish_count: AtomicUsize::new(0),
            send_error_count: AtomicUsize::new(0),
        }
    }

    /// Подписка на конкретный канал.
    ///
    /// Повторная подписка на тот же канал получит тот же `Sender`.
    pub fn subscribe(
        &self,
        channel: &str,
    ) -> Subscription {
        let key: Arc<str> = Arc::from(channel);
        let tx = self
            .channels
            .entry(key.clone())
            .or_insert_with(|| broadcast::channel(self.default_capacity).0)
            .clone();
        Subscription {
            channel: key,
            inner: tx.subscribe(),
        }
    }

    /// Публикация сообщения в канал.
    ///
    /// Возвращает число получателей, которым сообщение было доставлено в
    /// очередь. Если у канала не осталось подписчиков, он удаляется.
    pub fn publish(
        &self,
        channel: &str,
        payload: Bytes,
    ) -> usize {
        self.publish_count.fetch_add(1, Ordering::Relaxed);

        let Some(entry) = self.channels.get(channel) else {
            return 0;
        };
        let tx = entry.value().clone();
        let key = entry.key().clone();
        drop(entry);

        match tx.send(Message::new(key.clone(), payload)) {
            Ok(receivers) => receivers,
            Err(_) => {
                self.send_error_count.fetch_add(1, Ordering::Relaxed);
                self.channels
                    .remove_if(&*key, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }

    /// Удаляет все подписки на указанный канал (и сам канал).
    pub fn unsubscribe_all(
        &self,
        channel: &str,
    ) {
        self.channels.remove(channel);
    }

    /// Количество активных каналов.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
