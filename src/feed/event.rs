use crate::pubsub::{parse_feed_channel, FeedChannel, DEL_FEED_CHANNEL, NEW_FEED_CHANNEL};

/// Типизированное событие фида, восстановленное из уведомления.
///
/// Последнее поле каждого уведомления содержит идентификатор клиента-отправителя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Created {
        feed: String,
        client_id: String,
    },
    Deleted {
        feed: String,
        client_id: String,
    },
    Published {
        feed: String,
        id: String,
        item: String,
        client_id: String,
    },
    Edited {
        feed: String,
        id: String,
        item: String,
        client_id: String,
    },
    Retracted {
        feed: String,
        id: String,
        client_id: String,
    },
}

impl FeedEvent {
    /// Разбирает уведомление. `None` для пользовательских каналов и для
    /// уведомлений с неожиданным числом полей.
    pub fn decode(
        channel: &str,
        fields: &[String],
    ) -> Option<Self> {
        let event = match (channel, fields) {
            (NEW_FEED_CHANNEL, [feed, client_id]) => FeedEvent::Created {
                feed: feed.clone(),
                client_id: client_id.clone(),
            },
            (DEL_FEED_CHANNEL, [feed, client_id]) => FeedEvent::Deleted {
                feed: feed.clone(),
                client_id: client_id.clone(),
            },
            _ => {
                let (kind, feed) = parse_feed_channel(channel)?;
                let feed = feed.to_string();
                match (kind, fields) {
                    (FeedChannel::Publish, [id, item, client_id]) => FeedEvent::Published {
                        feed,
                        id: id.clone(),
                        item: item.clone(),
                        client_id: client_id.clone(),
                    },
                    (FeedChannel::Edit, [id, item, client_id]) => FeedEvent::Edited {
                        feed,
                        id: id.clone(),
                        item: item.clone(),
                        client_id: client_id.clone(),
                    },
                    (FeedChannel::Retract, [id, client_id]) => FeedEvent::Retracted {
                        feed,
                        id: id.clone(),
                        client_id: client_id.clone(),
                    },
                    _ => return None,
                }
            }
        };
        Some(event)
    }

    pub fn feed(&self) -> &str {
        match self {
            FeedEvent::Created { feed, .. }
            | FeedEvent::Deleted { feed, .. }
            | FeedEvent::Published { feed, .. }
            | FeedEvent::Edited { feed, .. }
            | FeedEvent::Retracted { feed, .. } => feed,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            FeedEvent::Created { client_id, .. }
            | FeedEvent::Deleted { client_id, .. }
            | FeedEvent::Published { client_id, .. }
            | FeedEvent::Edited { client_id, .. }
            | FeedEvent::Retracted { client_id, .. } => client_id,
        }
    }

    /// Id элемента для событий содержимого фида.
    pub fn id(&self) -> Option<&str> {
        match self {
            FeedEvent::Published { id, .. }
            | FeedEvent::Edited { id, .. }
            | FeedEvent::Retracted { id, .. } => Some(id),
            FeedEvent::Created { .. } | FeedEvent::Deleted { .. } => None,
        }
    }
}
