//! Диспетчеризация уведомлений подписчику поверх `InMemoryStore`.

use std::sync::Arc;

use parking_lot::Mutex;
use thoonk::{FeedEvent, Notification, SubscriptionState};

mod common;
use common::*;

/// Тест проверяет, что одновременные регистрации на неподписанный канал
/// завершаются после подтверждения в порядке поступления.
#[tokio::test]
async fn test_concurrent_registrations_resolve_in_order() {
    let (_store, _publisher, subscriber) = setup();

    let (a, b, c) = tokio::join!(
        subscriber.register_handler("chat", |_| {}),
        subscriber.register_handler("chat", |_| {}),
        subscriber.register_handler("chat", |_| {}),
    );
    assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (1, 2, 3));
    assert_eq!(subscriber.subscription_state("chat"), SubscriptionState::Subscribed);
    assert_eq!(subscriber.handler_count("chat"), 3);
}

/// Тест проверяет, что обработчики канала вызываются в порядке
/// регистрации, а удалённый обработчик больше не вызывается.
#[tokio::test]
async fn test_handler_order_and_removal() {
    let (_store, publisher, subscriber) = setup();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let mut ids = Vec::new();
    for tag in ["first", "second", "third"] {
        let calls = calls.clone();
        let id = subscriber
            .register_handler("chat", move |n: &Notification| {
                calls.lock().push(format!("{tag}:{}", n.fields[0]));
            })
            .await
            .unwrap();
        ids.push(id);
    }
    let mut done = collect(&subscriber, "chat").await;

    publisher.publish_channel("chat", &["hello"]).await.unwrap();
    next(&mut done).await;
    assert_eq!(
        *calls.lock(),
        vec!["first:hello", "second:hello", "third:hello"]
    );

    assert!(subscriber.remove_handler(ids[1]));
    assert!(!subscriber.remove_handler(ids[1]));
    assert!(!subscriber.remove_handler(9_999));

    calls.lock().clear();
    publisher.publish_channel("chat", &["again"]).await.unwrap();
    next(&mut done).await;
    assert_eq!(*calls.lock(), vec!["first:again", "third:again"]);
}

/// Тест проверяет, что произвольный канал доставляет поля вместе с
/// идентификатором клиента-издателя.
#[tokio::test]
async fn test_user_channel_fields() {
    let (_store, publisher, subscriber) = setup();
    let mut rx = collect(&subscriber, "alerts").await;

    let receivers = publisher
        .publish_channel("alerts", &["disk", "full"])
        .await
        .unwrap();
    assert_eq!(receivers, 1);

    let n = next(&mut rx).await;
    assert_eq!(n.channel, "alerts");
    assert_eq!(n.fields, vec!["disk", "full", publisher.client_id()]);
    assert_eq!(n.field(1), Some("full"));
    assert_eq!(n.field(5), None);
    assert_eq!(n.event(), None);
}

#[tokio::test]
async fn test_publish_without_subscribers() {
    let (_store, publisher, _subscriber) = setup();
    assert_eq!(publisher.publish_channel("nobody", &["x"]).await.unwrap(), 0);
}

/// Тест проверяет, что логические имена `create` и `delete` отображаются
/// на каналы жизненного цикла.
#[tokio::test]
async fn test_lifecycle_aliases_share_channel() {
    let (_store, publisher, subscriber) = setup();
    let mut by_alias = collect(&subscriber, "create").await;
    let mut by_channel = collect(&subscriber, "newfeed").await;
    assert_eq!(subscriber.handler_count("create"), 2);
    assert_eq!(subscriber.subscription_state("newfeed"), SubscriptionState::Subscribed);

    publisher.feed("news").await.unwrap();

    for rx in [&mut by_alias, &mut by_channel] {
        let n = next(rx).await;
        assert_eq!(
            n.event(),
            Some(FeedEvent::Created {
                feed: "news".into(),
                client_id: publisher.client_id().into(),
            })
        );
    }
}

/// Тест проверяет, что подписчик видит полный цикл событий фида.
#[tokio::test]
async fn test_feed_event_stream() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));

    for channel in [feed.publish_channel(), feed.edit_channel(), feed.retract_channel()] {
        let events = events.clone();
        subscriber
            .register_handler(channel, move |n: &Notification| {
                if let Some(event) = n.event() {
                    events.lock().push(event);
                }
            })
            .await
            .unwrap();
    }
    let mut published = collect(&subscriber, feed.publish_channel()).await;
    let mut edited = collect(&subscriber, feed.edit_channel()).await;
    let mut retracted = collect(&subscriber, feed.retract_channel()).await;

    feed.publish("v1", Some("a")).await.unwrap();
    feed.publish("v2", Some("a")).await.unwrap();
    feed.retract("a").await.unwrap();
    next(&mut published).await;
    next(&mut edited).await;
    next(&mut retracted).await;

    // каналы разные, порядок между ними не гарантирован
    let events = events.lock();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.feed() == "news" && e.id() == Some("a")));
    assert!(events.iter().any(|e| matches!(e, FeedEvent::Published { item, .. } if item == "v1")));
    assert!(events.iter().any(|e| matches!(e, FeedEvent::Edited { item, .. } if item == "v2")));
    assert!(events.iter().any(|e| matches!(e, FeedEvent::Retracted { .. })));
}

/// Тест проверяет, что подписчики разных клиентов получают одно и то же
/// уведомление.
#[tokio::test]
async fn test_multiple_subscribers() {
    let (store, publisher, first) = setup();
    let second = thoonk::SubscriberClient::in_memory(&store);
    let mut a = collect(&first, "chat").await;
    let mut b = collect(&second, "chat").await;

    assert_eq!(publisher.publish_channel("chat", &["hi"]).await.unwrap(), 2);
    assert_eq!(next(&mut a).await.fields, next(&mut b).await.fields);
}
