// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Publish / read benchmarks.
//
// Run with:
//   cargo bench --bench publish
//
// Groups:
//   publish_players: producer overwrite of N player slots
//   publish_frame:   full bracketed frame (players + names + counters)
//   read_snapshot:   consumer copy of a frame, sequenced vs. plain

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use shm_snapshot::{Consumer, Frame, Player, Producer, RegionConfig, Spectator};

const SIZES: &[usize] = &[1, 20, 60, 100];

fn region_name(tag: &str) -> String {
    format!("bench_{tag}_{}", std::process::id())
}

fn players(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| Player {
            health: i as i32,
            distance: i as f32,
            ..Player::default()
        })
        .collect()
}

fn bench_publish_players(c: &mut Criterion) {
    let mut producer = Producer::new(RegionConfig::new(region_name("players")));
    producer.initialize().expect("initialize");

    let mut group = c.benchmark_group("publish_players");
    for &n in SIZES {
        let list = players(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| producer.publish_players(black_box(list)).unwrap());
        });
    }
    group.finish();
}

fn bench_publish_frame(c: &mut Criterion) {
    let mut producer = Producer::new(RegionConfig::new(region_name("frame")));
    producer.initialize().expect("initialize");
    let names = vec![Spectator::new("spectator"); 10];

    let mut group = c.benchmark_group("publish_frame");
    for &n in SIZES {
        let list = players(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| {
                producer
                    .publish_frame(black_box(&Frame {
                        game_base: 1,
                        spectators: 10,
                        allied_spectators: 2,
                        players: list,
                        spectator_names: &names,
                    }))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_read_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_snapshot");
    for (label, sequenced) in [("sequenced", true), ("plain", false)] {
        let config = RegionConfig::new(region_name(label)).with_sequenced(sequenced);
        let mut producer = Producer::new(config.clone());
        producer.initialize().expect("initialize");
        producer.publish_players(&players(100)).unwrap();

        let mut consumer = Consumer::new(config);
        consumer.open().expect("open");

        group.bench_function(label, |b| {
            b.iter(|| black_box(consumer.read_snapshot().unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_publish_players,
    bench_publish_frame,
    bench_read_snapshot
);
criterion_main!(benches);
