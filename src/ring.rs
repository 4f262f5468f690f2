//! Fixed-size ring of rotated-file slots.
//!
//! Rotated files are named `"<prefix>.<index>"` with `index` in
//! `0..len`. The cursor names the slot the next rotation will fill and wraps
//! from `len - 1` back to `0`, so once the ring is full the oldest rotated
//! file is overwritten.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

/// Cursor over a ring of `len` rotated-file slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RotationRing {
    len: NonZeroUsize,
    cursor: usize,
}

impl RotationRing {
    /// Create a ring whose cursor starts at slot `0`.
    pub const fn new(len: NonZeroUsize) -> Self {
        Self { len, cursor: 0 }
    }

    /// Create a ring positioned at `cursor`, wrapped into range.
    pub const fn with_cursor(len: NonZeroUsize, cursor: usize) -> Self {
        Self {
            len,
            cursor: cursor % len.get(),
        }
    }

    /// Number of slots in the ring.
    pub const fn len(&self) -> usize {
        self.len.get()
    }

    /// Slot the next rotation will fill.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to the following slot and return the slot it left.
    pub fn advance(&mut self) -> usize {
        let filled = self.cursor;
        self.cursor = (self.cursor + 1) % self.len.get();
        filled
    }

    /// Change the number of slots.
    ///
    /// A cursor that no longer fits restarts at slot `0`.
    pub fn resize(&mut self, len: NonZeroUsize) {
        self.len = len;
        if self.cursor >= len.get() {
            self.cursor = 0;
        }
    }

    /// Path of the slot under the cursor.
    pub fn current_slot(&self, prefix: &Path) -> PathBuf {
        slot_path(prefix, self.cursor)
    }
}

/// Name of rotated slot `index` for the active file `prefix`.
///
/// The suffix is appended to the final path component so directories in the
/// prefix are preserved (`logs/app` becomes `logs/app.0`).
pub fn slot_path(prefix: &Path, index: usize) -> PathBuf {
    let mut slot = prefix.to_path_buf();
    let mut name = prefix
        .file_name()
        .map(|file_name| file_name.to_os_string())
        .unwrap_or_else(|| prefix.as_os_str().to_os_string());
    name.push(format!(".{index}"));
    slot.set_file_name(name);
    slot
}
