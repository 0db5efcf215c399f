// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Region configuration shared by producer and consumer.

use std::env;

/// Default object name. Both sides must agree on it.
///
/// Existing peers built against the older layout header use
/// `/apex_dma_shared`; set `SHM_SNAPSHOT_NAME` (or [`RegionConfig::new`]) to
/// that name to share a region with them.
pub const DEFAULT_REGION_NAME: &str = "/game_state_shared";

/// Default bound on seqlock read attempts before giving up on a clean copy.
pub const DEFAULT_READ_RETRIES: u32 = 64;

pub const ENV_NAME: &str = "SHM_SNAPSHOT_NAME";
pub const ENV_SEQUENCED: &str = "SHM_SNAPSHOT_SEQUENCED";
pub const ENV_READ_RETRIES: &str = "SHM_SNAPSHOT_READ_RETRIES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    /// Shared memory object name (leading '/' optional).
    pub name: String,
    /// Creator side: append the sequencing trailer. Ignored by openers,
    /// which detect the trailer from the object itself.
    pub sequenced: bool,
    /// Maximum attempts for a sequence-verified read.
    pub read_retries: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_REGION_NAME.to_string(),
            sequenced: true,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }
}

impl RegionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_sequenced(mut self, sequenced: bool) -> Self {
        self.sequenced = sequenced;
        self
    }

    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries.max(1);
        self
    }

    /// Defaults overridden by `SHM_SNAPSHOT_NAME`, `SHM_SNAPSHOT_SEQUENCED`
    /// and `SHM_SNAPSHOT_READ_RETRIES`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(name) = env::var(ENV_NAME) {
            if !name.is_empty() {
                cfg.name = name;
            }
        }
        if let Some(sequenced) = env::var(ENV_SEQUENCED).ok().as_deref().and_then(parse_bool) {
            cfg.sequenced = sequenced;
        }
        if let Some(retries) = env::var(ENV_READ_RETRIES)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            cfg = cfg.with_read_retries(retries);
        }
        cfg
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
