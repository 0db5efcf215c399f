// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Producer side: snapshot writer and settings reader.
//
// Publishes go straight into the live region; there is no staging buffer.
// Without the sequencing trailer a concurrent reader can observe a torn
// update (e.g. a new `player_count` over old array slots). With it, every
// publish is bracketed by the snapshot sequence so readers can detect that.

use std::sync::atomic::Ordering;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::config::RegionConfig;
use crate::error::{Error, Result};
use crate::layout::{
    Player, Spectator, MAX_PLAYERS, MAX_SPECTATORS, OFF_ALLIED_SPECTATORS, OFF_GAME_BASE,
    OFF_PLAYERS, OFF_PLAYER_COUNT, OFF_SPECTATORS, OFF_SPECTATOR_NAMES, OFF_SPECTATOR_NAME_COUNT,
};
use crate::region::Region;
use crate::sequence::{self, Consistency};
use crate::settings::Settings;
use crate::snapshot::Frame;

/// Owns the region on the producing side.
///
/// Starts unmapped; [`initialize`](Self::initialize) creates the region.
/// While unmapped, publish calls are no-ops and reads return
/// [`Error::Unmapped`].
pub struct Producer {
    config: RegionConfig,
    region: Option<Region>,
    // Serialises publishing threads of this process: the snapshot sequence
    // must have a single writer.
    write_lock: Mutex<()>,
}

impl Producer {
    pub fn new(config: RegionConfig) -> Self {
        Self {
            config,
            region: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Create (or recreate) the region. On failure the producer is left
    /// unmapped.
    pub fn initialize(&mut self) -> Result<()> {
        self.region = None;
        self.region = Some(Region::initialize(&self.config)?);
        Ok(())
    }

    /// Unmap and unlink the region.
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

    /// Current snapshot sequence, if the region is mapped and sequenced.
    pub fn sequence(&self) -> Option<u64> {
        let trailer = self.region.as_ref()?.trailer()?;
        Some(trailer.snapshot_seq.load(Ordering::Acquire))
    }

    pub fn publish_game_base(&self, value: u64) {
        self.write("game_base", |r| r.store(OFF_GAME_BASE, value));
    }

    /// Store both counters. They are not published atomically with respect
    /// to each other unless the region is sequenced.
    pub fn publish_spectator_counts(&self, total: i32, allied: i32) {
        self.write("spectator_counts", |r| {
            r.store(OFF_SPECTATORS, total);
            r.store(OFF_ALLIED_SPECTATORS, allied);
        });
    }

    /// Overwrite the player array prefix, then the count.
    ///
    /// More than [`MAX_PLAYERS`] entries is rejected and the region is left
    /// untouched. Slots past the new count keep whatever they held.
    pub fn publish_players(&self, players: &[Player]) -> Result<()> {
        check_capacity("players", players.len(), MAX_PLAYERS)?;
        self.write("players", |r| write_players(r, players));
        Ok(())
    }

    /// Same contract as [`publish_players`](Self::publish_players) for the
    /// spectator name list.
    pub fn publish_spectator_names(&self, names: &[Spectator]) -> Result<()> {
        check_capacity("spectator names", names.len(), MAX_SPECTATORS)?;
        self.write("spectator_names", |r| write_spectator_names(r, names));
        Ok(())
    }

    /// Publish every snapshot field inside one sequence bracket.
    ///
    /// Both lists are validated before anything is written.
    pub fn publish_frame(&self, frame: &Frame<'_>) -> Result<()> {
        check_capacity("players", frame.players.len(), MAX_PLAYERS)?;
        check_capacity(
            "spectator names",
            frame.spectator_names.len(),
            MAX_SPECTATORS,
        )?;
        self.write("frame", |r| {
            r.store(OFF_GAME_BASE, frame.game_base);
            r.store(OFF_SPECTATORS, frame.spectators);
            r.store(OFF_ALLIED_SPECTATORS, frame.allied_spectators);
            write_players(r, frame.players);
            write_spectator_names(r, frame.spectator_names);
        });
        Ok(())
    }

    /// Value copy of the consumer-written settings.
    ///
    /// Use [`read_settings_verified`](Self::read_settings_verified) to learn
    /// whether the copy came from a single complete write.
    pub fn read_settings(&self) -> Result<Settings> {
        self.read_settings_verified().map(|(settings, _)| settings)
    }

    /// Value copy of the settings together with its [`Consistency`].
    ///
    /// `Verified` only on a sequenced region, when one settings write
    /// bracketed the whole copy.
    pub fn read_settings_verified(&self) -> Result<(Settings, Consistency)> {
        let region = self.region.as_ref().ok_or(Error::Unmapped)?;
        let (record, consistency) = region.load_settings(self.config.read_retries);
        if region.is_sequenced() && !consistency.is_verified() {
            warn!(
                retries = self.config.read_retries,
                "settings kept changing during read, returning last copy"
            );
        }
        Ok((Settings::from(record), consistency))
    }

    fn write(&self, what: &'static str, f: impl FnOnce(&Region)) {
        let Some(region) = self.region.as_ref() else {
            debug!(what, "region not mapped, publish skipped");
            return;
        };
        let _serial = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _bracket = region
            .trailer()
            .map(|t| sequence::begin_write(&t.snapshot_seq));
        f(region);
    }
}

fn check_capacity(what: &'static str, len: usize, capacity: usize) -> Result<()> {
    if len > capacity {
        return Err(Error::CapacityExceeded {
            what,
            len,
            capacity,
        });
    }
    Ok(())
}

fn write_players(region: &Region, players: &[Player]) {
    region.store_slice(OFF_PLAYERS, players);
    region.store(OFF_PLAYER_COUNT, players.len());
}

fn write_spectator_names(region: &Region, names: &[Spectator]) {
    region.store_slice(OFF_SPECTATOR_NAMES, names);
    region.store(OFF_SPECTATOR_NAME_COUNT, names.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_producer_is_inert() {
        let p = Producer::new(RegionConfig::new("never_created_unit"));
        assert!(!p.is_mapped());
        p.publish_game_base(1);
        p.publish_spectator_counts(1, 1);
        p.publish_players(&[Player::default(); 3]).unwrap();
        assert!(matches!(p.read_settings(), Err(Error::Unmapped)));
        assert!(matches!(p.read_settings_verified(), Err(Error::Unmapped)));
        assert_eq!(p.sequence(), None);
        assert_eq!(p.config().name, "never_created_unit");
    }

    #[test]
    fn capacity_checked_even_when_unmapped() {
        let p = Producer::new(RegionConfig::new("never_created_unit"));
        let err = p
            .publish_players(&vec![Player::default(); MAX_PLAYERS + 1])
            .unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { len: 101, .. }));
    }
}
