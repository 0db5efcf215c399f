// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Usage:
//   demo_snapshot produce <interval_ms>
//   demo_snapshot watch <interval_ms>
//   demo_snapshot settings <profile.json>
//
// The producer creates the region and publishes a synthetic frame every
// <interval_ms>, logging settings changes it reads back. The watcher polls
// until the producer is up, then prints each snapshot. `settings` writes a
// JSON profile into a running region.
//
// Region name and sequencing come from SHM_SNAPSHOT_* env vars; log level
// from RUST_LOG.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use shm_snapshot::{Consumer, Frame, Player, Producer, RegionConfig, Settings, Spectator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn synthetic_players(tick: u64) -> Vec<Player> {
    let count = (tick % 10) as usize + 1;
    (0..count)
        .map(|i| {
            let phase = (tick as f32 * 0.05) + i as f32;
            let mut p = Player {
                head_x: 960.0 + phase.cos() * 300.0,
                head_y: 400.0 + phase.sin() * 100.0,
                origin_x: 960.0 + phase.cos() * 300.0,
                origin_y: 600.0 + phase.sin() * 100.0,
                health: 100 - (i as i32 * 10),
                shield: 50,
                team_num: (i % 3) as i32,
                distance: 10.0 * (i + 1) as f32,
                ..Player::default()
            };
            p.set_visible(i % 2 == 0);
            p.set_knocked(i == count - 1 && tick % 7 == 0);
            p
        })
        .collect()
}

fn do_produce(interval_ms: u64, quit: Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut producer = Producer::new(RegionConfig::from_env());
    producer.initialize().context("create shared region")?;

    let names = [Spectator::new("observer_one"), Spectator::new("observer_two")];
    let mut last_settings = None;
    let mut tick = 0u64;

    while !quit.load(Ordering::Acquire) {
        let players = synthetic_players(tick);
        producer.publish_frame(&Frame {
            game_base: 0x7ff6_0000_0000,
            spectators: names.len() as i32,
            allied_spectators: 1,
            players: &players,
            spectator_names: &names,
        })?;

        let (settings, consistency) = producer.read_settings_verified()?;
        if producer.sequence().is_some() && !consistency.is_verified() {
            warn!("settings read may be torn, skipping");
        } else if last_settings != Some(settings) {
            info!(?settings, "settings changed");
            last_settings = Some(settings);
        }

        tick += 1;
        thread::sleep(Duration::from_millis(interval_ms));
    }
    info!(frames = tick, "producer stopping");
    Ok(())
}

fn do_watch(interval_ms: u64, quit: Arc<AtomicBool>) -> anyhow::Result<()> {
    let mut consumer = Consumer::new(RegionConfig::from_env());

    while !quit.load(Ordering::Acquire) {
        if !consumer.is_current() {
            consumer.close();
            match consumer.open() {
                Ok(()) => info!("producer found"),
                Err(e) if e.is_not_ready() => {
                    println!("waiting for producer... ({e})");
                    thread::sleep(Duration::from_millis(interval_ms));
                    continue;
                }
                Err(e) => return Err(e).context("open shared region"),
            }
        }

        let snap = consumer.read_snapshot()?;
        if !snap.consistency.is_verified() {
            warn!("snapshot may be torn");
        }
        println!(
            "base={:#x} attached={} players={} spectators={}/{} names=[{}]",
            snap.game_base,
            snap.is_attached(),
            snap.players.len(),
            snap.spectators,
            snap.allied_spectators,
            snap.spectator_names
                .iter()
                .map(|s| s.name().into_owned())
                .collect::<Vec<_>>()
                .join(", ")
        );
        for (i, p) in snap.players.iter().enumerate() {
            let (health, shield, team) = (p.health, p.shield, p.team_num);
            println!(
                "  [{i}] hp={health} sh={shield} team={team} visible={} knocked={}",
                p.is_visible(),
                p.is_knocked()
            );
        }
        thread::sleep(Duration::from_millis(interval_ms));
    }
    Ok(())
}

fn do_settings(path: &str) -> anyhow::Result<()> {
    let settings = Settings::load_json(path).with_context(|| format!("load {path}"))?;
    let mut consumer = Consumer::new(RegionConfig::from_env());
    consumer.open().context("open shared region")?;
    consumer.write_settings(&settings);
    info!(?settings, "settings written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: demo_snapshot produce <interval_ms>");
        eprintln!("       demo_snapshot watch <interval_ms>");
        eprintln!("       demo_snapshot settings <profile.json>");
        std::process::exit(1);
    }

    let quit = Arc::new(AtomicBool::new(false));
    {
        let q = Arc::clone(&quit);
        on_terminate(move || q.store(true, Ordering::Release));
    }

    match args[1].as_str() {
        "produce" => do_produce(args[2].parse().context("interval_ms")?, quit),
        "watch" => do_watch(args[2].parse().context("interval_ms")?, quit),
        "settings" => do_settings(&args[2]),
        other => bail!("unknown mode: {other}"),
    }
}

// Sets the flag on SIGINT / SIGTERM / SIGHUP so the producer unlinks the
// region on the way out.
fn on_terminate(f: impl Fn() + Send + 'static) {
    use std::sync::{Mutex, OnceLock};
    static CB: OnceLock<Mutex<Box<dyn Fn() + Send>>> = OnceLock::new();
    CB.get_or_init(|| Mutex::new(Box::new(f)));
    extern "C" fn handler(_: libc::c_int) {
        if let Some(cb) = CB.get() {
            if let Ok(g) = cb.lock() {
                g();
            }
        }
    }
    unsafe {
        libc::signal(libc::SIGINT, handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGHUP, handler as *const () as libc::sighandler_t);
    }
}
