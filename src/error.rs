// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Error taxonomy for the snapshot transport.

use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while creating, opening or using a region.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An OS call (`shm_open`, `ftruncate`, `mmap`, ...) failed.
    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// The region name cannot be used as a POSIX shm name.
    #[error("invalid region name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// No object with this name exists (producer not running).
    #[error("region {name} does not exist")]
    NotFound { name: String },

    /// The object exists but is smaller than the base layout.
    #[error("region is {size} bytes, layout needs {required}")]
    TooSmall { size: usize, required: usize },

    /// The object exists but has not been stamped with the magic value.
    #[error("region not initialised (magic {found:#06x})")]
    NotReady { found: u32 },

    /// A publish call received more entries than the fixed array holds.
    #[error("too many {what}: {len} > {capacity}")]
    CapacityExceeded {
        what: &'static str,
        len: usize,
        capacity: usize,
    },

    /// A read was attempted on a handle with no mapping.
    #[error("region is not mapped")]
    Unmapped,

    /// A settings profile could not be parsed or serialised.
    #[error("settings profile: {0}")]
    Profile(#[from] serde_json::Error),

    /// A settings profile could not be read or written.
    #[error("settings profile I/O: {0}")]
    ProfileIo(#[source] io::Error),
}

impl Error {
    pub(crate) fn os(op: &'static str) -> Self {
        Error::Os {
            op,
            source: io::Error::last_os_error(),
        }
    }

    /// True for the "producer not yet running" class of failures.
    ///
    /// Consumers poll `open()` until this stops being the case.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::TooSmall { .. } | Error::NotReady { .. }
        )
    }
}
