//! Criterion benchmarks for the Airpong wire codec.
//!
//! The codec runs once per received datagram on the radio's receive context
//! and once per tick on the send path, so both directions must stay well
//! under a tick interval.
//!
//! Run with:
//! ```bash
//! cargo bench --package airpong-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use airpong_core::{decode_frame, encode_frame, LinkMessage, TickSnapshot};

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_probe() -> LinkMessage {
    LinkMessage::DiscoveryProbe
}

fn make_snapshot() -> LinkMessage {
    LinkMessage::Tick(TickSnapshot {
        tick_count: 4242,
        scored: false,
        paddle_pos: 67,
        ball_x: 88,
        ball_y: 120,
        ball_speed_x: -3,
        ball_speed_y: 2,
    })
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.bench_function("discovery_probe", |b| {
        let msg = make_probe();
        b.iter(|| encode_frame(black_box(&msg)))
    });
    group.bench_function("tick_snapshot", |b| {
        let msg = make_snapshot();
        b.iter(|| encode_frame(black_box(&msg)))
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    group.bench_function("discovery_probe", |b| {
        let bytes = encode_frame(&make_probe());
        b.iter(|| decode_frame(black_box(&bytes)))
    });
    group.bench_function("tick_snapshot", |b| {
        let bytes = encode_frame(&make_snapshot());
        b.iter(|| decode_frame(black_box(&bytes)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
