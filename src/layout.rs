// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Byte layout of the shared region. Every record is `repr(C, packed)` so the
// producer and consumer agree on field positions regardless of compiler; the
// offsets below are checked at compile time.
//
// Records inside the mapping are never referenced in place. Fields are read
// and written with unaligned copies at the byte offsets defined here.

use std::borrow::Cow;
use std::fmt;
use std::mem::{offset_of, size_of};
use std::sync::atomic::{AtomicU32, AtomicU64};

/// Sentinel stamped at offset 0 once the region is initialised.
pub const MAGIC: u32 = 0xABCD;

/// Capacity of the `players` array.
pub const MAX_PLAYERS: usize = 100;

/// Capacity of the `spectator_names` array.
pub const MAX_SPECTATORS: usize = 100;

/// Fixed size of a spectator name buffer.
pub const SPECTATOR_NAME_LEN: usize = 64;

/// One observed entity. Identity is positional and only meaningful within a
/// single publication.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Player {
    pub head_x: f32,
    pub head_y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub health: i32,
    pub shield: i32,
    pub team_num: i32,
    pub distance: f32,
    pub visible: u8,
    pub knocked: u8,
}

impl Player {
    pub fn is_visible(&self) -> bool {
        self.visible != 0
    }

    pub fn is_knocked(&self) -> bool {
        self.knocked != 0
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = u8::from(visible);
    }

    pub fn set_knocked(&mut self, knocked: bool) {
        self.knocked = u8::from(knocked);
    }
}

/// A spectator name: 64 raw bytes, NUL-padded when shorter.
#[repr(C, packed)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Spectator {
    pub name: [u8; SPECTATOR_NAME_LEN],
}

impl Spectator {
    /// Build from a string, truncated on a char boundary to fit 64 bytes.
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(SPECTATOR_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; SPECTATOR_NAME_LEN];
        buf[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self { name: buf }
    }

    /// The name up to the first NUL (or all 64 bytes), lossily decoded.
    pub fn name(&self) -> Cow<'_, str> {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SPECTATOR_NAME_LEN);
        String::from_utf8_lossy(&self.name[..len])
    }
}

impl Default for Spectator {
    fn default() -> Self {
        Self {
            name: [0; SPECTATOR_NAME_LEN],
        }
    }
}

impl fmt::Debug for Spectator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Spectator").field(&self.name()).finish()
    }
}

/// Raw settings record as stored in the region. Flags are bytes, any
/// non-zero value reads as true. See [`crate::Settings`] for the typed view.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsRecord {
    pub aim_enabled: u8,
    pub esp_enabled: u8,
    pub player_glow_enabled: u8,
    pub aim_no_recoil: u8,
    pub aiming: u8,
    pub shooting: u8,
    pub firing_range: u8,
    pub onevone: u8,

    pub max_dist: f32,
    pub smooth: f32,
    pub max_fov: f32,
    pub bone: i32,

    pub glow_r: f32,
    pub glow_g: f32,
    pub glow_b: f32,

    pub glow_r_visible: f32,
    pub glow_g_visible: f32,
    pub glow_b_visible: f32,

    pub glow_r_knocked: f32,
    pub glow_g_knocked: f32,
    pub glow_b_knocked: f32,
}

/// The root record. Only used for its layout; the crate never builds one.
#[repr(C, packed)]
pub struct SharedData {
    pub magic: u32,
    pub game_base: u64,
    pub spectators: i32,
    pub allied_spectators: i32,
    pub player_count: usize,
    pub spectator_name_count: usize,
    pub settings: SettingsRecord,
    pub players: [Player; MAX_PLAYERS],
    pub spectator_names: [Spectator; MAX_SPECTATORS],
}

pub const OFF_MAGIC: usize = offset_of!(SharedData, magic);
pub const OFF_GAME_BASE: usize = offset_of!(SharedData, game_base);
pub const OFF_SPECTATORS: usize = offset_of!(SharedData, spectators);
pub const OFF_ALLIED_SPECTATORS: usize = offset_of!(SharedData, allied_spectators);
pub const OFF_PLAYER_COUNT: usize = offset_of!(SharedData, player_count);
pub const OFF_SPECTATOR_NAME_COUNT: usize = offset_of!(SharedData, spectator_name_count);
pub const OFF_SETTINGS: usize = offset_of!(SharedData, settings);
pub const OFF_PLAYERS: usize = offset_of!(SharedData, players);
pub const OFF_SPECTATOR_NAMES: usize = offset_of!(SharedData, spectator_names);

/// Size of the base layout in bytes.
pub const LAYOUT_SIZE: usize = size_of::<SharedData>();

const WORD: usize = size_of::<usize>();

const _: () = assert!(size_of::<Player>() == 34);
const _: () = assert!(size_of::<Spectator>() == 64);
const _: () = assert!(size_of::<SettingsRecord>() == 60);
const _: () = assert!(offset_of!(SettingsRecord, max_dist) == 8);
const _: () = assert!(offset_of!(SettingsRecord, bone) == 20);
const _: () = assert!(offset_of!(SettingsRecord, glow_r) == 24);
const _: () = assert!(offset_of!(SettingsRecord, glow_r_visible) == 36);
const _: () = assert!(offset_of!(SettingsRecord, glow_r_knocked) == 48);
const _: () = assert!(OFF_MAGIC == 0);
const _: () = assert!(OFF_GAME_BASE == 4);
const _: () = assert!(OFF_SPECTATORS == 12);
const _: () = assert!(OFF_ALLIED_SPECTATORS == 16);
const _: () = assert!(OFF_PLAYER_COUNT == 20);
const _: () = assert!(OFF_SPECTATOR_NAME_COUNT == 20 + WORD);
const _: () = assert!(OFF_SETTINGS == 20 + 2 * WORD);
const _: () = assert!(OFF_PLAYERS == OFF_SETTINGS + 60);
const _: () = assert!(OFF_SPECTATOR_NAMES == OFF_PLAYERS + 34 * MAX_PLAYERS);
const _: () = assert!(LAYOUT_SIZE == OFF_SPECTATOR_NAMES + 64 * MAX_SPECTATORS);
#[cfg(target_pointer_width = "64")]
const _: () = assert!(LAYOUT_SIZE == 9896);

// ---------------------------------------------------------------------------
// Optional sequencing trailer, placed right after the base layout
// ---------------------------------------------------------------------------

/// "SQ01"
pub const TRAILER_TAG: u32 = 0x5351_3031;

/// Seqlock counters. `snapshot_seq` is written only by the producer,
/// `settings_seq` only by the consumer. Odd means a write is in progress.
#[repr(C)]
#[allow(dead_code)] // only ever viewed through the mapping
pub(crate) struct SeqTrailer {
    pub(crate) tag: AtomicU32,
    _reserved: u32,
    pub(crate) snapshot_seq: AtomicU64,
    pub(crate) settings_seq: AtomicU64,
}

pub const TRAILER_OFFSET: usize = LAYOUT_SIZE;
pub const TRAILER_SIZE: usize = size_of::<SeqTrailer>();

/// Object size when the sequencing trailer is enabled.
pub const SEQUENCED_SIZE: usize = TRAILER_OFFSET + TRAILER_SIZE;

const _: () = assert!(TRAILER_OFFSET % 8 == 0);
const _: () = assert!(TRAILER_SIZE == 24);

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn offsets_match_packed_c_layout() {
        assert_eq!(OFF_PLAYER_COUNT, 20);
        assert_eq!(OFF_SPECTATOR_NAME_COUNT, 28);
        assert_eq!(OFF_SETTINGS, 36);
        assert_eq!(OFF_PLAYERS, 96);
        assert_eq!(OFF_SPECTATOR_NAMES, 3496);
        assert_eq!(LAYOUT_SIZE, 9896);
        assert_eq!(SEQUENCED_SIZE, 9920);
    }

    #[test]
    fn spectator_name_roundtrip() {
        let s = Spectator::new("watcher");
        assert_eq!(s.name(), "watcher");
        assert_eq!(s.name[7], 0);
    }

    #[test]
    fn spectator_name_truncates_on_char_boundary() {
        // 63 ASCII bytes followed by a 2-byte char must not split it.
        let long = format!("{}é", "a".repeat(63));
        let s = Spectator::new(&long);
        assert_eq!(s.name().len(), 63);
        assert_eq!(s.name[63], 0);
    }

    #[test]
    fn spectator_full_buffer_has_no_terminator() {
        let s = Spectator { name: [b'z'; SPECTATOR_NAME_LEN] };
        assert_eq!(s.name().len(), SPECTATOR_NAME_LEN);
    }

    #[test]
    fn player_flags() {
        let mut p = Player::default();
        assert!(!p.is_visible());
        p.set_visible(true);
        p.set_knocked(true);
        assert!(p.is_visible() && p.is_knocked());
        p.knocked = 7;
        assert!(p.is_knocked());
    }
}
