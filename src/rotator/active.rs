//! Book-keeping for the file currently being appended to.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use crate::{config::RotatorConfig, ring::RotationRing};

/// Snapshot of the active file as seen by the writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveFileState {
    /// Path of the active file (the configured prefix).
    pub path: PathBuf,
    /// Ring slot the next rotation will fill.
    pub rotation_index: usize,
    /// Bytes in the active file, seeded from the file size when opened.
    pub bytes_written: u64,
}

/// Shared active-file state.
///
/// Lives behind its own mutex: the writer updates it after every record and
/// the facade only touches it while no writer is running, apart from
/// snapshots.
#[derive(Debug)]
pub(crate) struct ActiveFile {
    path: PathBuf,
    ring: RotationRing,
    bytes_written: u64,
}

fn ring_len(config: &RotatorConfig) -> NonZeroUsize {
    NonZeroUsize::new(config.max_rotated_files).unwrap_or(NonZeroUsize::MIN)
}

impl ActiveFile {
    pub(crate) fn new(config: &RotatorConfig) -> Self {
        Self {
            path: config.active_path().to_path_buf(),
            ring: RotationRing::new(ring_len(config)),
            bytes_written: 0,
        }
    }

    /// Point at a new prefix and ring size, keeping the rotation index when
    /// it still fits.
    pub(crate) fn retarget(&mut self, config: &RotatorConfig) {
        self.path = config.active_path().to_path_buf();
        self.ring.resize(ring_len(config));
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn current_slot(&self) -> PathBuf {
        self.ring.current_slot(&self.path)
    }

    pub(crate) fn advance(&mut self) -> usize {
        self.ring.advance()
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub(crate) fn record_written(&mut self, bytes: u64) {
        self.bytes_written = self.bytes_written.saturating_add(bytes);
    }

    pub(crate) fn reset_written(&mut self, bytes: u64) {
        self.bytes_written = bytes;
    }

    /// Strictly greater: a file that lands exactly on the limit is kept.
    pub(crate) fn exceeds(&self, size_limit_bytes: u64) -> bool {
        self.bytes_written > size_limit_bytes
    }

    pub(crate) fn snapshot(&self) -> ActiveFileState {
        ActiveFileState {
            path: self.path.clone(),
            rotation_index: self.ring.cursor(),
            bytes_written: self.bytes_written,
        }
    }
}
