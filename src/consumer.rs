// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Consumer side: snapshot reader and settings writer. Mirror image of the
// producer; the only thing it writes is the settings record.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::RegionConfig;
use crate::error::{Error, Result};
use crate::layout::{
    SettingsRecord, MAX_PLAYERS, MAX_SPECTATORS, OFF_ALLIED_SPECTATORS, OFF_GAME_BASE,
    OFF_PLAYERS, OFF_PLAYER_COUNT, OFF_SETTINGS, OFF_SPECTATORS, OFF_SPECTATOR_NAMES,
    OFF_SPECTATOR_NAME_COUNT,
};
use crate::region::Region;
use crate::sequence::{self, Consistency};
use crate::settings::Settings;
use crate::snapshot::Snapshot;

/// Maps a region created by the producer.
///
/// Waiting for the producer is done by polling [`open`](Self::open) until it
/// stops failing with a not-ready error; nothing here blocks.
pub struct Consumer {
    config: RegionConfig,
    region: Option<Region>,
    // The settings sequence must have a single writer.
    write_lock: Mutex<()>,
}

impl Consumer {
    pub fn new(config: RegionConfig) -> Self {
        Self {
            config,
            region: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Map the producer's region, replacing any previous mapping.
    pub fn open(&mut self) -> Result<()> {
        self.region = None;
        self.region = Some(Region::open(&self.config)?);
        Ok(())
    }

    /// Drop the mapping. Never unlinks.
    pub fn close(&mut self) {
        self.region = None;
    }

    pub fn is_mapped(&self) -> bool {
        self.region.is_some()
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn config(&self) -> &RegionConfig {
        &self.config
    }

    /// Mapped and stamped with the magic value.
    pub fn is_ready(&self) -> bool {
        self.region.as_ref().is_some_and(Region::is_ready)
    }

    /// Mapped, and the name still refers to the mapped object. False after
    /// the producer exits or restarts; reopen in that case.
    pub fn is_current(&self) -> bool {
        self.region.as_ref().is_some_and(Region::is_current)
    }

    /// Copy the producer-owned part of the region.
    pub fn read_snapshot(&self) -> Result<Snapshot> {
        let region = self.region.as_ref().ok_or(Error::Unmapped)?;
        let (mut snapshot, consistency) = match region.trailer() {
            Some(t) => sequence::read_consistent(&t.snapshot_seq, self.config.read_retries, || {
                copy_snapshot(region)
            }),
            None => (copy_snapshot(region), Consistency::Unverified),
        };
        if region.is_sequenced() && !consistency.is_verified() {
            warn!(
                retries = self.config.read_retries,
                "snapshot kept changing during read, returning last copy"
            );
        }
        snapshot.consistency = consistency;
        Ok(snapshot)
    }

    /// Read back the settings record currently in the region.
    pub fn read_settings(&self) -> Result<Settings> {
        let region = self.region.as_ref().ok_or(Error::Unmapped)?;
        Ok(Settings::from(region.load_settings(self.config.read_retries).0))
    }

    /// Overwrite the settings record, and nothing else. No-op when unmapped.
    pub fn write_settings(&self, settings: &Settings) {
        let Some(region) = self.region.as_ref() else {
            debug!("region not mapped, settings write skipped");
            return;
        };
        let _serial = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _bracket = region
            .trailer()
            .map(|t| sequence::begin_write(&t.settings_seq));
        region.store(OFF_SETTINGS, SettingsRecord::from(settings));
    }
}

fn copy_snapshot(region: &Region) -> Snapshot {
    let player_count = clamp_count(region.load(OFF_PLAYER_COUNT), MAX_PLAYERS, "player_count");
    let name_count = clamp_count(
        region.load(OFF_SPECTATOR_NAME_COUNT),
        MAX_SPECTATORS,
        "spectator_name_count",
    );
    Snapshot {
        game_base: region.load(OFF_GAME_BASE),
        spectators: region.load(OFF_SPECTATORS),
        allied_spectators: region.load(OFF_ALLIED_SPECTATORS),
        players: region.load_vec(OFF_PLAYERS, player_count),
        spectator_names: region.load_vec(OFF_SPECTATOR_NAMES, name_count),
        consistency: Consistency::Unverified,
    }
}

// A count beyond capacity can only come from a foreign or broken writer;
// never index past the array because of it.
fn clamp_count(raw: usize, capacity: usize, field: &'static str) -> usize {
    if raw > capacity {
        warn!(field, raw, capacity, "count exceeds capacity, clamping");
        return capacity;
    }
    raw
}
