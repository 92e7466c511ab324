//! Criterion benchmarks for the monome-core OSC path.
//!
//! Measures command encoding and the inbound decode-and-route path that a
//! session's receive loop runs for every datagram.
//!
//! Run with:
//! ```bash
//! cargo bench --package monome-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use monome_core::protocol::{decode_datagram, encode_command, grid_table, Command};
use rosc::{OscMessage, OscPacket, OscType};

fn key_datagram() -> Vec<u8> {
    rosc::encoder::encode(&OscPacket::Message(OscMessage {
        addr: "/monome/grid/key".to_string(),
        args: vec![OscType::Int(3), OscType::Int(5), OscType::Int(1)],
    }))
    .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let led_set = Command::LedSet { x: 3, y: 5, state: 1 };
    group.bench_function("LedSet", |b| {
        b.iter(|| encode_command(black_box(&led_set), black_box("monome")).unwrap())
    });

    let ring_all = Command::RingAll {
        encoder: 1,
        level: 15,
    };
    group.bench_function("RingAll", |b| {
        b.iter(|| encode_command(black_box(&ring_all), black_box("monome")).unwrap())
    });

    group.finish();
}

fn bench_decode_and_route(c: &mut Criterion) {
    let table = grid_table("monome");
    let bytes = key_datagram();

    c.bench_function("decode_and_route/grid_key", |b| {
        b.iter(|| {
            let messages = decode_datagram(black_box(&bytes)).unwrap();
            for msg in &messages {
                black_box(table.route(msg));
            }
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode_and_route);
criterion_main!(benches);
