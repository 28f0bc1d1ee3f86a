use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use parking_lot::Mutex;
use thoonk_error::{StackError, SubscribeError, ThoonkResult};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::{
    engine::{InMemoryStore, PubSub, PubSubListener},
    pubsub::{channel_for_event, decode_fields, Notification},
};

/// Идентификатор обработчика, уникальный в пределах одного клиента.
pub type HandlerId = u64;

/// Обработчик уведомлений канала.
pub type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Состояние подписки на канал.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    /// Запрос подписки отправлен, подтверждения ещё нет.
    Subscribing,
    Subscribed,
}

/// Регистрация, ожидающая подтверждения подписки.
struct PendingRegistration {
    handler: Handler,
    reply: oneshot::Sender<ThoonkResult<HandlerId>>,
}

enum ChannelState {
    Subscribing(Vec<PendingRegistration>),
    Subscribed,
}

enum Admission {
    Registered(HandlerId),
    Queued,
    MustSubscribe,
}

/// Реестр обработчиков и состояний подписки.
#[derive(Default)]
struct Registry {
    next_id: HandlerId,
    channels: HashMap<String, ChannelState>,
    /// Канал → обработчики. `BTreeMap` по возрастающему id хранит порядок
    /// регистрации.
    handlers: HashMap<String, BTreeMap<HandlerId, Handler>>,
    owners: HashMap<HandlerId, String>,
}

impl Registry {
    fn state(
        &self,
        channel: &str,
    ) -> SubscriptionState {
        match self.channels.get(channel) {
            None => SubscriptionState::Unsubscribed,
            Some(ChannelState::Subscribing(_)) => SubscriptionState::Subscribing,
            Some(ChannelState::Subscribed) => SubscriptionState::Subscribed,
        }
    }

    fn register(
        &mut self,
        channel: &str,
        handler: Handler,
    ) -> HandlerId {
        self.next_id += 1;
        let id = self.next_id;
        self.handlers
            .entry(channel.to_string())
            .or_default()
            .insert(id, handler);
        self.owners.insert(id, channel.to_string());
        id
    }

    fn unregister(
        &mut self,
        id: HandlerId,
    ) -> bool {
        let Some(channel) = self.owners.remove(&id) else {
            return false;
        };
        if let Some(handlers) = self.handlers.get_mut(&channel) {
            handlers.remove(&id);
            if handlers.is_empty() {
                self.handlers.remove(&channel);
            }
        }
        true
    }

    /// Регистрирует сразу, ставит в очередь или требует начать подписку.
    fn admit(
        &mut self,
        channel: &str,
        handler: Handler,
        reply: oneshot::Sender<ThoonkResult<HandlerId>>,
    ) -> Admission {
        match self.channels.get_mut(channel) {
            Some(ChannelState::Subscribed) => {}
            Some(ChannelState::Subscribing(queue)) => {
                queue.push(PendingRegistration { handler, reply });
                return Admission::Queued;
            }
            None => {
                self.channels.insert(
                    channel.to_string(),
                    ChannelState::Subscribing(vec![PendingRegistration { handler, reply }]),
                );
                return Admission::MustSubscribe;
            }
        }
        Admission::Registered(self.register(channel, handler))
    }
}

/// Получатель событий подписочного соединения, разносящий уведомления по
/// обработчикам.
#[derive(Default)]
struct Dispatcher {
    registry: Mutex<Registry>,
}

impl Dispatcher {
    /// Завершает ошибкой все регистрации канала, ждущие подписки, и
    /// возвращает канал в `Unsubscribed`.
    fn fail_pending(
        &self,
        channel: &str,
        reason: &str,
    ) {
        let removed = self.registry.lock().channels.remove(channel);
        let pending = match removed {
            Some(ChannelState::Subscribing(queue)) => queue,
            Some(ChannelState::Subscribed) => {
                self.registry
                    .lock()
                    .channels
                    .insert(channel.to_string(), ChannelState::Subscribed);
                return;
            }
            None => return,
        };

        warn!(channel, reason, pending = pending.len(), "subscribe failed");
        for registration in pending {
            let err = SubscribeError::SubscribeFailed {
                channel: channel.to_string(),
                reason: reason.to_string(),
            };
            let _ = registration.reply.send(Err(err.into()));
        }
    }
}

impl PubSubListener for Dispatcher {
    fn on_subscribed(
        &self,
        channel: &str,
    ) {
        let mut registry = self.registry.lock();
        let previous = registry
            .channels
            .insert(channel.to_string(), ChannelState::Subscribed);
        let pending = match previous {
            Some(ChannelState::Subscribing(queue)) => queue,
            Some(ChannelState::Subscribed) => return,
            None => {
                registry.channels.remove(channel);
                debug!(channel, "confirmation for unknown channel ignored");
                return;
            }
        };

        debug!(channel, pending = pending.len(), "subscription confirmed");
        for registration in pending {
            let id = registry.register(channel, registration.handler);
            if registration.reply.send(Ok(id)).is_err() {
                // вызывающий перестал ждать, id никто не узнает
                registry.unregister(id);
            }
        }
    }

    fn on_message(
        &self,
        channel: &str,
        payload: &[u8],
    ) {
        let handlers: Vec<Handler> = match self.registry.lock().handlers.get(channel) {
            Some(handlers) => handlers.values().cloned().collect(),
            None => return,
        };

        let Some(fields) = decode_fields(payload) else {
            warn!(channel, len = payload.len(), "dropping malformed notification");
            return;
        };

        let notification = Notification::new(channel, fields);
        trace!(channel, handlers = handlers.len(), "dispatching notification");
        for handler in handlers {
            handler(&notification);
        }
    }
}

/// Клиент-подписчик: ленивые подписки на каналы и реестр обработчиков.
///
/// Подписка на канал открывается при первой регистрации обработчика.
/// Регистрации, пришедшие до подтверждения подписки, выполняются после
/// него в порядке поступления. Обработчики одного канала вызываются в
/// порядке регистрации.
pub struct SubscriberClient {
    dispatcher: Arc<Dispatcher>,
    pubsub: Arc<dyn PubSub>,
}

impl SubscriberClient {
    /// Создаёт клиента. `connect` открывает подписочное соединение,
    /// доставляющее события переданному получателю.
    ///
    /// ```ignore
    /// let subscriber = SubscriberClient::new(|listener| {
    ///     Arc::new(my_adapter.pubsub(listener)) as Arc<dyn PubSub>
    /// });
    /// ```
    pub fn new<F>(connect: F) -> Self
    where
        F: FnOnce(Arc<dyn PubSubListener>) -> Arc<dyn PubSub>,
    {
        let dispatcher = Arc::new(Dispatcher::default());
        let listener: Arc<dyn PubSubListener> = dispatcher.clone();
        let pubsub = connect(listener);
        Self { dispatcher, pubsub }
    }

    /// Подписчик поверх [`InMemoryStore`].
    pub fn in_memory(store: &InMemoryStore) -> Self {
        Self::new(|listener| Arc::new(store.pubsub(listener)) as Arc<dyn PubSub>)
    }

    /// Регистрирует обработчик события и возвращает его id.
    ///
    /// `event` задаётся логическим именем (`create`, `delete`) или именем канала.
    /// Завершается, когда канал подписан и обработчик добавлен.
    pub async fn register_handler<F>(
        &self,
        event: &str,
        handler: F,
    ) -> ThoonkResult<HandlerId>
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let channel = channel_for_event(event);
        let (reply, rx) = oneshot::channel();

        let admission = self
            .dispatcher
            .registry
            .lock()
            .admit(channel, Arc::new(handler), reply);

        match admission {
            Admission::Registered(id) => {
                trace!(channel, id, "handler registered");
                return Ok(id);
            }
            Admission::Queued => trace!(channel, "registration queued behind subscribe"),
            Admission::MustSubscribe => {
                debug!(channel, "subscribing");
                if let Err(e) = self.pubsub.subscribe(channel).await {
                    self.dispatcher.fail_pending(channel, &e.to_string());
                }
            }
        }

        rx.await
            .map_err(|_| StackError::from(SubscribeError::DispatcherGone))?
    }

    /// Удаляет обработчик. Неизвестный id ничего не делает и даёт `false`.
    pub fn remove_handler(
        &self,
        id: HandlerId,
    ) -> bool {
        let removed = self.dispatcher.registry.lock().unregister(id);
        trace!(id, removed, "remove handler");
        removed
    }

    /// Число обработчиков, зарегистрированных на событие.
    pub fn handler_count(
        &self,
        event: &str,
    ) -> usize {
        self.dispatcher
            .registry
            .lock()
            .handlers
            .get(channel_for_event(event))
            .map_or(0, BTreeMap::len)
    }

    pub fn subscription_state(
        &self,
        event: &str,
    ) -> SubscriptionState {
        self.dispatcher.registry.lock().state(channel_for_event(event))
    }
}
