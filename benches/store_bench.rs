//! Store Benchmarks - Hot-Path Costs
//!
//! Measures the paths hit on every store access: cached loads, cold
//! loads with decoding and migration, immediate saves and replacing a
//! pending delayed write.
//!
//! Run with: cargo bench --bench store_bench

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

use versioned_store::Store;
use versioned_store::adapters::persistence::{JsonCodec, MemoryBackend};
use versioned_store::domain::{Envelope, VersionTag};
use versioned_store::ports::codec::Codec;

fn payload() -> Value {
    json!({
        "devices": (0..64)
            .map(|i| json!({"id": i, "name": format!("device-{i}"), "enabled": i % 2 == 0}))
            .collect::<Vec<_>>(),
    })
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Load served from the in-memory cache.
fn bench_cached_load(c: &mut Criterion) {
    let rt = runtime();
    let store: Store<Value> = Store::builder("bench", 1, Arc::new(MemoryBackend::new())).build();
    rt.block_on(store.save(payload())).unwrap();

    c.bench_function("load_cached", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(store.load().await.unwrap());
        });
    });
}

/// Load that reads, decodes and minor-migrates from the backend.
fn bench_cold_load(c: &mut Criterion) {
    let rt = runtime();
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_json(
        "bench",
        &json!({"version": 1, "minor_version": 1, "key": "bench", "data": payload()}),
    );

    c.bench_function("load_cold_minor_migration", |b| {
        b.to_async(&rt).iter(|| async {
            let store: Store<Value> = Store::builder("bench", 1, backend.clone())
                .minor_version(2)
                .build();
            black_box(store.load().await.unwrap());
        });
    });
}

fn bench_save(c: &mut Criterion) {
    let rt = runtime();
    let store: Store<Value> = Store::builder("bench", 1, Arc::new(MemoryBackend::new())).build();

    c.bench_function("save_immediate", |b| {
        b.to_async(&rt).iter(|| async {
            store.save(black_box(payload())).await.unwrap();
        });
    });
}

/// Replacing a pending delayed write: the coalescing fast path.
fn bench_delay_save_replace(c: &mut Criterion) {
    let rt = runtime();
    let store: Store<Value> = Store::builder("bench", 1, Arc::new(MemoryBackend::new())).build();

    c.bench_function("delay_save_replace", |b| {
        b.to_async(&rt).iter(|| async {
            store.delay_save(payload, Duration::from_secs(3600));
        });
    });
}

fn bench_envelope_codec(c: &mut Criterion) {
    let envelope = Envelope::new("bench", VersionTag::new(1, 1), payload());
    let codec = JsonCodec::compact();
    let bytes = codec.encode(&envelope).unwrap();

    c.bench_function("envelope_encode", |b| {
        b.iter(|| black_box(codec.encode(black_box(&envelope)).unwrap()));
    });
    c.bench_function("envelope_decode", |b| {
        b.iter(|| black_box(codec.decode(black_box(&bytes)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_cached_load,
    bench_cold_load,
    bench_save,
    bench_delay_save_replace,
    bench_envelope_codec,
);
criterion_main!(benches);
