// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Seqlock over a single u64 counter in the trailer.
//
// Writer: counter goes odd, release fence, plain data stores, counter goes
// even with a release store. Reader: acquire load, copy, acquire fence,
// reload. The copy is clean when both loads agree on the same even value.
// Each counter has exactly one writer.

use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::thread;

/// Whether a copied value is known to come from a single complete write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// Bracketed by the same even sequence value before and after the copy.
    Verified { sequence: u64 },
    /// No trailer, or the writer kept interfering until retries ran out.
    /// The copy may be torn.
    Unverified,
}

impl Consistency {
    pub fn is_verified(&self) -> bool {
        matches!(self, Consistency::Verified { .. })
    }
}

/// Holds the counter odd until dropped.
pub(crate) struct WriteGuard<'a> {
    seq: &'a AtomicU64,
    next: u64,
}

pub(crate) fn begin_write(seq: &AtomicU64) -> WriteGuard<'_> {
    let cur = seq.load(Ordering::Relaxed);
    // An odd value left behind by a writer that died mid-write still moves
    // forward to a fresh odd value.
    let odd = if cur % 2 == 0 {
        cur.wrapping_add(1)
    } else {
        cur.wrapping_add(2)
    };
    seq.store(odd, Ordering::Relaxed);
    fence(Ordering::Release);
    WriteGuard {
        seq,
        next: odd.wrapping_add(1),
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.seq.store(self.next, Ordering::Release);
    }
}

/// Copy with `copy` until a clean bracket is observed or `attempts` run out.
/// The last copy is returned either way.
pub(crate) fn read_consistent<T>(
    seq: &AtomicU64,
    attempts: u32,
    mut copy: impl FnMut() -> T,
) -> (T, Consistency) {
    let attempts = attempts.max(1);
    let mut tries = 0;
    loop {
        tries += 1;
        let before = seq.load(Ordering::Acquire);
        let value = copy();
        fence(Ordering::Acquire);
        let after = seq.load(Ordering::Relaxed);

        if before % 2 == 0 && before == after {
            return (value, Consistency::Verified { sequence: before });
        }
        if tries >= attempts {
            return (value, Consistency::Unverified);
        }
        thread::yield_now();
    }
}
