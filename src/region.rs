// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Region manager: creates or opens the named object, validates it, and
// gives the producer/consumer byte-offset access to the mapped layout.

use std::mem::{size_of, size_of_val};
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, info};

use crate::config::RegionConfig;
use crate::error::{Error, Result};
use crate::layout::{
    Player, SeqTrailer, SettingsRecord, Spectator, LAYOUT_SIZE, MAGIC, OFF_MAGIC, OFF_SETTINGS,
    SEQUENCED_SIZE, TRAILER_OFFSET, TRAILER_TAG,
};
use crate::platform::{PlatformShm, ShmMode};
use crate::sequence::{self, Consistency};

/// Which side of the protocol holds this mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    /// Created the object; unlinks it on drop unless a newer creator has
    /// replaced it under the same name.
    Creator,
    /// Mapped an existing object; never unlinks.
    Opener,
}

/// Types for which every bit pattern is a valid value, so they can be copied
/// in and out of memory another process writes.
///
/// # Safety
/// Implementors must have no padding-dependent invariants, no references and
/// no niche (e.g. no `bool`, no enums).
pub(crate) unsafe trait Plain: Copy {}

unsafe impl Plain for u32 {}
unsafe impl Plain for u64 {}
unsafe impl Plain for i32 {}
unsafe impl Plain for usize {}
unsafe impl Plain for Player {}
unsafe impl Plain for Spectator {}
unsafe impl Plain for SettingsRecord {}

/// A mapped snapshot region.
///
/// The mapping is released on drop; a [`RegionRole::Creator`] also removes
/// the name from the OS namespace.
pub struct Region {
    shm: PlatformShm,
    sequenced: bool,
}

impl Region {
    /// Create a fresh region, replacing any stale object of the same name.
    ///
    /// The object is sized to the layout (plus the sequencing trailer when
    /// `config.sequenced`), zero-filled, and stamped with [`MAGIC`] last.
    pub fn initialize(config: &RegionConfig) -> Result<Self> {
        let size = if config.sequenced {
            SEQUENCED_SIZE
        } else {
            LAYOUT_SIZE
        };
        let shm = PlatformShm::acquire(&config.name, size, ShmMode::Create)?;
        unsafe { ptr::write_bytes(shm.as_mut_ptr(), 0, size) };

        let region = Self {
            shm,
            sequenced: config.sequenced,
        };
        if let Some(trailer) = region.trailer() {
            trailer.tag.store(TRAILER_TAG, Ordering::Relaxed);
        }
        region.magic_cell().store(MAGIC, Ordering::Release);

        info!(
            name = region.name(),
            size,
            sequenced = region.sequenced,
            "shared region created"
        );
        Ok(region)
    }

    /// Map an existing region without creating or resizing it.
    ///
    /// Fails with a not-ready error ([`Error::is_not_ready`]) when the object
    /// is missing, too small, or not yet stamped with [`MAGIC`].
    pub fn open(config: &RegionConfig) -> Result<Self> {
        let shm = PlatformShm::acquire(&config.name, LAYOUT_SIZE, ShmMode::Open)?;
        let mut region = Self {
            shm,
            sequenced: false,
        };

        let found = region.magic();
        if found != MAGIC {
            return Err(Error::NotReady { found });
        }

        region.sequenced = region.shm.size() >= SEQUENCED_SIZE && {
            let trailer = unsafe { region.trailer_unchecked() };
            trailer.tag.load(Ordering::Relaxed) == TRAILER_TAG
        };
        info!(
            name = region.name(),
            size = region.size(),
            sequenced = region.sequenced,
            "shared region opened"
        );
        Ok(region)
    }

    /// Remove a named region without holding it. Missing names are ignored.
    pub fn unlink_by_name(name: &str) {
        PlatformShm::unlink_by_name(name);
    }

    /// POSIX name (with leading '/').
    pub fn name(&self) -> &str {
        self.shm.name()
    }

    /// Mapped size in bytes.
    pub fn size(&self) -> usize {
        self.shm.size()
    }

    pub fn role(&self) -> RegionRole {
        if self.shm.is_owner() {
            RegionRole::Creator
        } else {
            RegionRole::Opener
        }
    }

    /// Whether the sequencing trailer is present.
    pub fn is_sequenced(&self) -> bool {
        self.sequenced
    }

    /// Current value of the magic field.
    pub fn magic(&self) -> u32 {
        self.magic_cell().load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.magic() == MAGIC
    }

    /// Whether the name still refers to this mapping. Goes false once the
    /// creator has gone away or been replaced.
    pub fn is_current(&self) -> bool {
        self.shm.is_current()
    }

    // --- crate-internal field access ---

    fn base(&self) -> *mut u8 {
        self.shm.as_mut_ptr()
    }

    fn magic_cell(&self) -> &AtomicU32 {
        // mmap returns page-aligned memory, so offset 0 is aligned for u32.
        unsafe { &*(self.base().add(OFF_MAGIC) as *const AtomicU32) }
    }

    /// # Safety
    /// The mapping must be at least [`SEQUENCED_SIZE`] bytes.
    unsafe fn trailer_unchecked(&self) -> &SeqTrailer {
        &*(self.base().add(TRAILER_OFFSET) as *const SeqTrailer)
    }

    pub(crate) fn trailer(&self) -> Option<&SeqTrailer> {
        self.sequenced.then(|| unsafe { self.trailer_unchecked() })
    }

    pub(crate) fn load<T: Plain>(&self, offset: usize) -> T {
        assert!(offset + size_of::<T>() <= self.size());
        unsafe { ptr::read_unaligned(self.base().add(offset).cast::<T>()) }
    }

    pub(crate) fn store<T: Plain>(&self, offset: usize, value: T) {
        assert!(offset + size_of::<T>() <= self.size());
        unsafe { ptr::write_unaligned(self.base().add(offset).cast::<T>(), value) }
    }

    pub(crate) fn store_slice<T: Plain>(&self, offset: usize, items: &[T]) {
        let len = size_of_val(items);
        assert!(offset + len <= self.size());
        unsafe {
            ptr::copy_nonoverlapping(items.as_ptr().cast::<u8>(), self.base().add(offset), len)
        }
    }

    pub(crate) fn load_vec<T: Plain>(&self, offset: usize, count: usize) -> Vec<T> {
        let len = count * size_of::<T>();
        assert!(offset + len <= self.size());
        let mut out = Vec::<T>::with_capacity(count);
        unsafe {
            ptr::copy_nonoverlapping(self.base().add(offset), out.as_mut_ptr().cast::<u8>(), len);
            out.set_len(count);
        }
        out
    }

    /// Copy the settings record, seqlock-verified when the trailer exists.
    pub(crate) fn load_settings(&self, attempts: u32) -> (SettingsRecord, Consistency) {
        match self.trailer() {
            Some(t) => sequence::read_consistent(&t.settings_seq, attempts, || {
                self.load::<SettingsRecord>(OFF_SETTINGS)
            }),
            None => (self.load(OFF_SETTINGS), Consistency::Unverified),
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        debug!(name = self.name(), role = ?self.role(), "releasing shared region");
    }
}
