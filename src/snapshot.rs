// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors

use crate::layout::{Player, Spectator};
use crate::sequence::Consistency;

/// Everything the producer publishes, borrowed for one bracketed write.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frame<'a> {
    pub game_base: u64,
    pub spectators: i32,
    pub allied_spectators: i32,
    pub players: &'a [Player],
    pub spectator_names: &'a [Spectator],
}

/// A value copy of the producer-owned part of the region.
///
/// Only the populated prefixes of the two arrays are copied. Indices carry no
/// identity across snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub game_base: u64,
    pub spectators: i32,
    pub allied_spectators: i32,
    pub players: Vec<Player>,
    pub spectator_names: Vec<Spectator>,
    pub consistency: Consistency,
}

impl Snapshot {
    /// The producer is running and has published a non-zero game base.
    pub fn is_attached(&self) -> bool {
        self.game_base != 0
    }
}
