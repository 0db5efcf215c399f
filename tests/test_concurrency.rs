// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Writer and reader racing on one region through separate mappings, the way
// two processes would.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use shm_snapshot::{Consumer, Frame, Player, Producer, RegionConfig, Settings, MAX_PLAYERS};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{}_{n}", std::process::id())
}

/// Frame `id`: `id % 100 + 1` players, every one with `health == id`, and
/// `game_base == id`. Any mix of two frames breaks one of those.
fn frame_players(id: u32) -> Vec<Player> {
    let n = id as usize % MAX_PLAYERS + 1;
    vec![
        Player {
            health: id as i32,
            ..Player::default()
        };
        n
    ]
}

#[test]
fn verified_snapshots_are_never_torn() {
    const FRAMES: u32 = 2_000;

    let config = RegionConfig::new(unique_name("race")).with_read_retries(10_000);
    let mut producer = Producer::new(config.clone());
    producer.initialize().unwrap();
    let mut consumer = Consumer::new(config);
    consumer.open().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut verified = 0usize;
            loop {
                // One last read after the writer is done, so at least one
                // quiescent snapshot is checked.
                let finished = done.load(Ordering::Acquire);
                let snap = consumer.read_snapshot().unwrap();
                if snap.consistency.is_verified() && snap.game_base != 0 {
                    let id = snap.game_base as u32;
                    assert_eq!(snap.players.len(), id as usize % MAX_PLAYERS + 1);
                    assert!(snap.players.iter().all(|p| {
                        let health = p.health;
                        health == id as i32
                    }));
                    verified += 1;
                }
                if finished {
                    break;
                }
            }
            verified
        })
    };

    for id in 1..=FRAMES {
        let players = frame_players(id);
        producer
            .publish_frame(&Frame {
                game_base: u64::from(id),
                players: &players,
                ..Frame::default()
            })
            .unwrap();
        thread::yield_now();
    }
    done.store(true, Ordering::Release);

    let verified = reader.join().expect("reader panicked");
    assert!(verified > 0);
}

#[test]
fn verified_settings_are_never_torn() {
    const WRITES: i32 = 2_000;

    let config = RegionConfig::new(unique_name("settings_race")).with_read_retries(10_000);
    let mut producer = Producer::new(config.clone());
    producer.initialize().unwrap();
    let mut consumer = Consumer::new(config);
    consumer.open().unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let writer = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for k in 1..=WRITES {
                let v = k as f32;
                consumer.write_settings(&Settings {
                    bone: k,
                    max_dist: v,
                    smooth: v,
                    max_fov: v,
                    ..Settings::default()
                });
                thread::yield_now();
            }
            done.store(true, Ordering::Release);
        })
    };

    while !done.load(Ordering::Acquire) {
        let s = producer.read_settings().unwrap();
        if s.bone == 0 {
            continue;
        }
        // With enough retries every read is clean: all fields from one write.
        let v = s.bone as f32;
        assert_eq!((s.max_dist, s.smooth, s.max_fov), (v, v, v));
    }
    writer.join().unwrap();
    assert_eq!(producer.read_settings().unwrap().bone, WRITES);
}

#[test]
fn producer_is_shareable_across_threads() {
    let config = RegionConfig::new(unique_name("shared_producer"));
    let mut producer = Producer::new(config.clone());
    producer.initialize().unwrap();
    let producer = Arc::new(producer);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let producer = Arc::clone(&producer);
            thread::spawn(move || {
                for _ in 0..100 {
                    producer.publish_spectator_counts(t, t);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // 400 bracketed writes, serialised: the counter ends even and exact.
    assert_eq!(producer.sequence(), Some(800));
}
