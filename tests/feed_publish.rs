//! Публикация, правка, вытеснение и удаление элементов фида.

use std::collections::HashSet;

use thoonk::{FeedConfig, FeedError, FeedEvent, StatusCode, MAX_LENGTH};

mod common;
use common::*;

fn max_length(n: &str) -> FeedConfig {
    FeedConfig::from([(MAX_LENGTH.to_string(), n.to_string())])
}

/// Тест проверяет, что публикация без id даёт новый id и событие publish.
#[tokio::test]
async fn test_publish_generates_id_and_notifies() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut published = collect(&subscriber, feed.publish_channel()).await;

    let id = feed.publish("x", None).await.unwrap();
    assert!(!id.is_empty());
    assert_eq!(feed.get_item(&id).await.unwrap().as_deref(), Some("x"));

    let n = next(&mut published).await;
    assert_eq!(n.fields, vec![id.as_str(), "x", publisher.client_id()]);
    assert_eq!(
        n.event(),
        Some(FeedEvent::Published {
            feed: "news".into(),
            id: id.clone(),
            item: "x".into(),
            client_id: publisher.client_id().into(),
        })
    );

    let other = feed.publish("x", None).await.unwrap();
    assert_ne!(id, other);
}

/// Тест проверяет, что повторная публикация того же id даёт событие edit.
#[tokio::test]
async fn test_republish_same_id_is_edit() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut published = collect(&subscriber, feed.publish_channel()).await;
    let mut edited = collect(&subscriber, feed.edit_channel()).await;

    assert_eq!(feed.publish("y", Some("X")).await.unwrap(), "X");
    assert_eq!(feed.publish("z", Some("X")).await.unwrap(), "X");

    let first = next(&mut published).await;
    assert_eq!(first.fields[..2], ["X", "y"]);
    let second = next(&mut edited).await;
    assert!(matches!(
        second.event(),
        Some(FeedEvent::Edited { ref id, ref item, .. }) if id == "X" && item == "z"
    ));
    assert_quiet(&publisher, feed.publish_channel(), &mut published).await;

    assert_eq!(feed.get_item("X").await.unwrap().as_deref(), Some("z"));
    assert_eq!(feed.get_ids().await.unwrap(), vec!["X"]);
    assert_eq!(feed.get_publish_count().await.unwrap(), 2);
}

/// Тест проверяет, что при max_length = N остаются N самых свежих id и
/// ровно одно событие retract для вытесненного.
#[tokio::test]
async fn test_max_length_evicts_oldest() {
    let (_store, publisher, subscriber) = setup();
    publisher.create_feed("news", &max_length("3")).await.unwrap();
    let feed = publisher.feed("news").await.unwrap();
    let mut retracted = collect(&subscriber, feed.retract_channel()).await;

    for id in ["a", "b", "c", "d"] {
        feed.publish(&format!("item {id}"), Some(id)).await.unwrap();
    }

    assert_eq!(feed.get_ids().await.unwrap(), vec!["b", "c", "d"]);
    assert!(!feed.has_id("a").await.unwrap());
    assert_eq!(feed.get_all().await.unwrap().len(), 3);

    let n = next(&mut retracted).await;
    assert_eq!(n.fields, vec!["a", publisher.client_id()]);
    assert_quiet(&publisher, feed.retract_channel(), &mut retracted).await;
}

/// Тест проверяет, что правка поднимает id наверх и спасает его от
/// вытеснения.
#[tokio::test]
async fn test_edit_bumps_id_to_most_recent() {
    let (_store, publisher, _subscriber) = setup();
    publisher.create_feed("news", &max_length("3")).await.unwrap();
    let feed = publisher.feed("news").await.unwrap();

    for id in ["a", "b", "c"] {
        feed.publish(id, Some(id)).await.unwrap();
    }
    feed.publish("a2", Some("a")).await.unwrap();
    assert_eq!(feed.get_ids().await.unwrap(), vec!["b", "c", "a"]);

    feed.publish("d", Some("d")).await.unwrap();
    assert_eq!(feed.get_ids().await.unwrap(), vec!["c", "a", "d"]);
    assert_eq!(feed.get_item("a").await.unwrap().as_deref(), Some("a2"));
}

/// Тест проверяет, что уменьшение max_length срезает лишнее при следующей
/// публикации.
#[tokio::test]
async fn test_shrinking_max_length() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut retracted = collect(&subscriber, feed.retract_channel()).await;

    for i in 0..5 {
        feed.publish("v", Some(i.to_string().as_str())).await.unwrap();
    }
    feed.set_config(&max_length("2")).await.unwrap();
    feed.publish("v", Some("5")).await.unwrap();

    assert_eq!(feed.get_ids().await.unwrap(), vec!["4", "5"]);
    let mut evicted = HashSet::new();
    for _ in 0..4 {
        evicted.insert(next(&mut retracted).await.fields[0].clone());
    }
    let expected: HashSet<String> = ["0", "1", "2", "3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(evicted, expected);
}

#[tokio::test]
async fn test_non_positive_max_length_is_unbounded() {
    let (_store, publisher, _subscriber) = setup();
    publisher.create_feed("news", &max_length("0")).await.unwrap();
    let feed = publisher.feed("news").await.unwrap();
    for i in 0..10 {
        feed.publish("v", Some(i.to_string().as_str())).await.unwrap();
    }
    assert_eq!(feed.get_ids().await.unwrap().len(), 10);
}

/// Тест проверяет, что retract неизвестного id ничего не делает.
#[tokio::test]
async fn test_retract_unknown_id_is_noop() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut retracted = collect(&subscriber, feed.retract_channel()).await;
    feed.publish("keep", Some("k")).await.unwrap();

    feed.retract("missing").await.unwrap();
    assert_eq!(feed.get_ids().await.unwrap(), vec!["k"]);
    assert_quiet(&publisher, feed.retract_channel(), &mut retracted).await;
}

#[tokio::test]
async fn test_retract_existing_id() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut retracted = collect(&subscriber, feed.retract_channel()).await;
    feed.publish("one", Some("1")).await.unwrap();
    feed.publish("two", Some("2")).await.unwrap();

    feed.retract("1").await.unwrap();
    assert_eq!(feed.get_ids().await.unwrap(), vec!["2"]);
    assert_eq!(feed.get_item("1").await.unwrap(), None);
    assert!(!feed.has_id("1").await.unwrap());

    let n = next(&mut retracted).await;
    assert!(matches!(n.event(), Some(FeedEvent::Retracted { ref id, .. }) if id == "1"));

    // повторный retract снова тихий
    feed.retract("1").await.unwrap();
    assert_quiet(&publisher, feed.retract_channel(), &mut retracted).await;
}

#[tokio::test]
async fn test_separator_in_item_rejected() {
    let (_store, publisher, _subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();

    let err = feed.publish("bad\0item", None).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidArgs);
    assert!(matches!(
        err.downcast_ref::<FeedError>(),
        Some(FeedError::InvalidField { .. })
    ));
    assert!(feed.publish("ok", Some("bad\0id")).await.is_err());
    assert!(feed.get_ids().await.unwrap().is_empty());
    assert_eq!(feed.get_publish_count().await.unwrap(), 0);
}

/// Тест проверяет, что пустой элемент допустим и доходит пустым полем.
#[tokio::test]
async fn test_empty_item() {
    let (_store, publisher, subscriber) = setup();
    let feed = publisher.feed("news").await.unwrap();
    let mut published = collect(&subscriber, feed.publish_channel()).await;

    feed.publish("", Some("e")).await.unwrap();
    assert_eq!(feed.get_item("e").await.unwrap().as_deref(), Some(""));
    let n = next(&mut published).await;
    assert_eq!(n.fields, vec!["e", "", publisher.client_id()]);
}
