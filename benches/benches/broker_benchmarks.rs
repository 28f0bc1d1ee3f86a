use std::hint::black_box;

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use thoonk::pubsub::{decode_fields, encode_fields, Broker, Subscription};

fn bench_subscribe(c: &mut Criterion) {
    let broker = Broker::new(1024);
    c.bench_function("broker_subscribe", |b| {
        b.iter(|| {
            let _sub = black_box(broker.subscribe("chan"));
        })
    });
}

fn bench_publish_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("broker_publish");
    for subscribers in [0usize, 1, 10, 100] {
        let broker = Broker::new(1024);
        let mut subs: Vec<Subscription> =
            (0..subscribers).map(|_| broker.subscribe("chan")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &subscribers, |b, _| {
            b.iter(|| {
                black_box(broker.publish("chan", Bytes::from_static(b"x")));
                // не даём подписчикам отстать
                for sub in subs.iter_mut() {
                    let _ = sub.try_recv();
                }
            })
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let fields = ["4f3c2a1b", "some item body of moderate length", "client-id"];
    let payload = encode_fields(&fields).unwrap();

    c.bench_function("encode_fields", |b| {
        b.iter(|| black_box(encode_fields(black_box(&fields)).unwrap()))
    });
    c.bench_function("decode_fields", |b| {
        b.iter(|| black_box(decode_fields(black_box(&payload))))
    });
}

criterion_group!(benches, bench_subscribe, bench_publish_fanout, bench_codec);
criterion_main!(benches);
