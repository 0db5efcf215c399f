// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Fixed-layout POSIX shared memory transport for game-state snapshots.
// A producer process publishes players, spectators and a game base; a consumer
// process reads them and writes back operator settings. The byte layout is
// packed and matches a C struct built with `#pragma pack(1)`.

#[cfg(not(unix))]
compile_error!("shm-snapshot requires POSIX shared memory");

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::RegionConfig;

pub mod layout;
pub use layout::{Player, SettingsRecord, Spectator, MAGIC, MAX_PLAYERS, MAX_SPECTATORS};

pub mod shm_name;

mod platform;

mod sequence;
pub use sequence::Consistency;

mod region;
pub use region::{Region, RegionRole};

mod settings;
pub use settings::{Rgb, Settings};

mod snapshot;
pub use snapshot::{Frame, Snapshot};

mod producer;
pub use producer::Producer;

mod consumer;
pub use consumer::Consumer;
