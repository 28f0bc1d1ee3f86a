use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, Criterion};
use thoonk::{FeedConfig, InMemoryStore, PublisherClient, MAX_LENGTH};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn bench_publish_new_ids(c: &mut Criterion) {
    let rt = runtime();
    let feed = rt.block_on(async {
        let publisher = PublisherClient::new(Arc::new(InMemoryStore::new()));
        publisher.feed("bench").await.unwrap()
    });

    let feed = &feed;
    c.bench_function("feed_publish_unbounded", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(feed.publish("payload", None).await.unwrap()) })
    });
}

/// Каждая публикация в полный фид вытесняет один элемент.
fn bench_publish_with_eviction(c: &mut Criterion) {
    let rt = runtime();
    let feed = rt.block_on(async {
        let publisher = PublisherClient::new(Arc::new(InMemoryStore::new()));
        let config = FeedConfig::from([(MAX_LENGTH.to_string(), "100".to_string())]);
        publisher.create_feed("bench", &config).await.unwrap();
        publisher.feed("bench").await.unwrap()
    });

    let feed = &feed;
    c.bench_function("feed_publish_max_length_100", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(feed.publish("payload", None).await.unwrap()) })
    });
}

fn bench_edit_same_id(c: &mut Criterion) {
    let rt = runtime();
    let feed = rt.block_on(async {
        let publisher = PublisherClient::new(Arc::new(InMemoryStore::new()));
        publisher.feed("bench").await.unwrap()
    });

    let feed = &feed;
    c.bench_function("feed_edit_same_id", |b| {
        b.to_async(&rt)
            .iter(|| async move { black_box(feed.publish("payload", Some("fixed")).await.unwrap()) })
    });
}

criterion_group!(
    benches,
    bench_publish_new_ids,
    bench_publish_with_eviction,
    bench_edit_same_id
);
criterion_main!(benches);
