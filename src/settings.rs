// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Typed view of the operator settings record, plus JSON profiles.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::SettingsRecord;

/// An RGB colour with components nominally in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Operator-configured toggles and tunables.
///
/// Written by the consumer, read by the producer. Every other part of the
/// region flows the other way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub aim_enabled: bool,
    pub esp_enabled: bool,
    pub player_glow_enabled: bool,
    pub aim_no_recoil: bool,
    pub aiming: bool,
    pub shooting: bool,
    pub firing_range: bool,
    pub onevone: bool,

    pub max_dist: f32,
    pub smooth: f32,
    pub max_fov: f32,
    /// Target bone selector (0 head, 1 neck, 2 chest by convention).
    pub bone: i32,

    pub glow: Rgb,
    pub glow_visible: Rgb,
    pub glow_knocked: Rgb,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aim_enabled: false,
            esp_enabled: false,
            player_glow_enabled: false,
            aim_no_recoil: true,
            aiming: false,
            shooting: false,
            firing_range: false,
            onevone: false,

            max_dist: 200.0 * 40.0,
            smooth: 10.0,
            max_fov: 5.0,
            bone: 2,

            glow: Rgb::new(1.0, 0.0, 0.0),
            glow_visible: Rgb::new(0.0, 1.0, 0.0),
            glow_knocked: Rgb::new(0.0, 0.0, 1.0),
        }
    }
}

impl Settings {
    /// Load a JSON profile. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(Error::ProfileIo)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write this profile as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(Error::ProfileIo)
    }
}

impl From<SettingsRecord> for Settings {
    fn from(r: SettingsRecord) -> Self {
        Self {
            aim_enabled: r.aim_enabled != 0,
            esp_enabled: r.esp_enabled != 0,
            player_glow_enabled: r.player_glow_enabled != 0,
            aim_no_recoil: r.aim_no_recoil != 0,
            aiming: r.aiming != 0,
            shooting: r.shooting != 0,
            firing_range: r.firing_range != 0,
            onevone: r.onevone != 0,

            max_dist: r.max_dist,
            smooth: r.smooth,
            max_fov: r.max_fov,
            bone: r.bone,

            glow: Rgb::new(r.glow_r, r.glow_g, r.glow_b),
            glow_visible: Rgb::new(r.glow_r_visible, r.glow_g_visible, r.glow_b_visible),
            glow_knocked: Rgb::new(r.glow_r_knocked, r.glow_g_knocked, r.glow_b_knocked),
        }
    }
}

impl From<&Settings> for SettingsRecord {
    fn from(s: &Settings) -> Self {
        Self {
            aim_enabled: u8::from(s.aim_enabled),
            esp_enabled: u8::from(s.esp_enabled),
            player_glow_enabled: u8::from(s.player_glow_enabled),
            aim_no_recoil: u8::from(s.aim_no_recoil),
            aiming: u8::from(s.aiming),
            shooting: u8::from(s.shooting),
            firing_range: u8::from(s.firing_range),
            onevone: u8::from(s.onevone),

            max_dist: s.max_dist,
            smooth: s.smooth,
            max_fov: s.max_fov,
            bone: s.bone,

            glow_r: s.glow.r,
            glow_g: s.glow.g,
            glow_b: s.glow.b,
            glow_r_visible: s.glow_visible.r,
            glow_g_visible: s.glow_visible.g,
            glow_b_visible: s.glow_visible.b,
            glow_r_knocked: s.glow_knocked.r,
            glow_g_knocked: s.glow_knocked.g,
            glow_b_knocked: s.glow_knocked.b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrip() {
        let s = Settings {
            aim_enabled: true,
            onevone: true,
            max_dist: -1.5,
            bone: -3,
            glow_knocked: Rgb::new(f32::MAX, 0.0, -0.0),
            ..Settings::default()
        };
        let back = Settings::from(SettingsRecord::from(&s));
        assert_eq!(back, s);
    }

    #[test]
    fn nonzero_flag_bytes_read_as_true() {
        let r = SettingsRecord {
            esp_enabled: 0xff,
            ..SettingsRecord::default()
        };
        let s = Settings::from(r);
        assert!(s.esp_enabled);
        assert!(!s.aim_enabled);
    }

    #[test]
    fn profile_fills_missing_fields() {
        let s: Settings = serde_json::from_str(r#"{ "esp_enabled": true, "bone": 0 }"#).unwrap();
        assert!(s.esp_enabled);
        assert_eq!(s.bone, 0);
        assert_eq!(s.smooth, Settings::default().smooth);
        assert!(s.aim_no_recoil);
    }

    #[test]
    fn profile_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "shm_snapshot_profile_{}.json",
            std::process::id()
        ));
        let s = Settings {
            player_glow_enabled: true,
            max_fov: 12.5,
            ..Settings::default()
        };
        s.save_json(&path).unwrap();
        let back = Settings::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, s);
    }

    #[test]
    fn missing_profile_is_io_error() {
        let err = Settings::load_json("/nonexistent/dir/profile.json").unwrap_err();
        assert!(matches!(err, Error::ProfileIo(_)));
    }
}
