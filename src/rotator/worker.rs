//! Background writer thread for [`Rotator`](super::Rotator).
//!
//! The worker owns the active file handle exclusively. It receives
//! [`Command`] values over the hand-off queue, appends records, rotates the
//! file once it grows past the size limit and acknowledges flush requests.
//! Steady-state I/O failures are logged and never reported to producers: a
//! record that made it into the queue has already been acknowledged.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, RecvError, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;

use super::active::ActiveFile;
use crate::{rate_limited_warner::RateLimitedWarner, size::format_size};

pub(crate) const WORKER_THREAD_NAME: &str = "logrotate-writer";

/// Commands sent to the worker thread.
#[derive(Debug)]
pub(crate) enum Command {
    Record(Vec<u8>),
    Flush(Sender<()>),
    /// Sentinel: drain and exit.
    Shutdown,
}

/// Result of one pass through the rotation algorithm.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RotationOutcome {
    /// The active file now lives at `slot` and a fresh file is open.
    Rotated { slot: PathBuf },
    /// The rename failed; the old file was reopened and the index kept.
    RenameFailed,
    /// Renamed, but no new active file could be opened.
    ReopenFailed,
}

/// Open `path` for appending, creating it if needed, and report its size.
pub(crate) fn open_active(path: &Path) -> io::Result<(File, u64)> {
    #[expect(
        clippy::ineffective_open_options,
        reason = "Be explicit about write intent alongside append"
    )]
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(true)
        .open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Open a replacement active file after a rotation or a failed open.
fn open_fresh(path: &Path) -> io::Result<(File, u64)> {
    #[cfg(test)]
    if let Some(err) = super::fresh_failure::take(path) {
        return Err(err);
    }
    open_active(path)
}

/// Reopen the active path and re-derive the byte count from its size.
fn reopen(active: &mut ActiveFile) -> Option<File> {
    match open_fresh(active.path()) {
        Ok((file, len)) => {
            active.reset_written(len);
            Some(file)
        }
        Err(err) => {
            warn!(
                "Rotator writer: failed to reopen {}: {err}",
                active.path().display()
            );
            None
        }
    }
}

/// Move the active file into the next ring slot and open a fresh one.
///
/// Callers hold the active-file lock for the whole sequence.
pub(crate) fn rotate(file: &mut Option<File>, active: &mut ActiveFile) -> RotationOutcome {
    if let Some(current) = file.take() {
        if let Err(err) = current.sync_all() {
            warn!(
                "Rotator writer: sync before rotating {} failed: {err}",
                active.path().display()
            );
        }
    }

    let slot = active.current_slot();
    if let Err(err) = fs::rename(active.path(), &slot) {
        warn!(
            "Rotator writer: failed to rotate {} to {}: {err}",
            active.path().display(),
            slot.display()
        );
        *file = reopen(active);
        return RotationOutcome::RenameFailed;
    }
    active.advance();

    match open_fresh(active.path()) {
        Ok((fresh, len)) => {
            active.reset_written(len);
            *file = Some(fresh);
            RotationOutcome::Rotated { slot }
        }
        Err(err) => {
            warn!(
                "Rotator writer: failed to open fresh {} after rotation: {err}",
                active.path().display()
            );
            active.reset_written(0);
            RotationOutcome::ReopenFailed
        }
    }
}

struct ActiveWriter {
    file: Option<File>,
    active: Arc<Mutex<ActiveFile>>,
    size_limit_bytes: u64,
    write_failures: RateLimitedWarner,
    discarded: RateLimitedWarner,
}

impl ActiveWriter {
    /// Open the active file and report readiness to the starter.
    ///
    /// Returns `None` when the file cannot be opened or the starter stopped
    /// waiting; in both cases the worker must exit without consuming. The
    /// shared byte count is only seeded once the starter has accepted the
    /// handshake, since an abandoned worker may outlive a newer one.
    fn initialise(
        path: &Path,
        active: Arc<Mutex<ActiveFile>>,
        size_limit_bytes: u64,
        ready_tx: &Sender<io::Result<()>>,
    ) -> Option<Self> {
        let (file, len) = match open_active(path) {
            Ok(opened) => opened,
            Err(err) => {
                warn!("Rotator writer: failed to open {}: {err}", path.display());
                let _ = ready_tx.send(Err(err));
                return None;
            }
        };
        // Held across the handshake so `start` never returns before the count
        // is seeded.
        let mut book = active.lock();
        if ready_tx.send(Ok(())).is_err() {
            drop(book);
            warn!(
                "Rotator writer: start for {} was abandoned; exiting",
                path.display()
            );
            return None;
        }
        book.reset_written(len);
        drop(book);
        debug!(
            "Rotator writer: appending to {} ({} already present, limit {})",
            path.display(),
            format_size(len),
            format_size(size_limit_bytes)
        );
        Some(Self {
            file: Some(file),
            active,
            size_limit_bytes,
            write_failures: RateLimitedWarner::default(),
            discarded: RateLimitedWarner::default(),
        })
    }

    fn run(&mut self, rx: &Receiver<Command>) {
        loop {
            match rx.recv() {
                Ok(Command::Record(bytes)) => self.write_record(&bytes),
                Ok(Command::Flush(ack)) => {
                    self.sync();
                    let _ = ack.send(());
                }
                Ok(Command::Shutdown) => {
                    debug!("Rotator writer: shutdown requested");
                    return;
                }
                Err(RecvError) => {
                    debug!("Rotator writer: queue disconnected");
                    return;
                }
            }
        }
    }

    fn write_record(&mut self, bytes: &[u8]) {
        if self.file.is_none() {
            self.file = reopen(&mut self.active.lock());
        }
        let written = match self.file.as_mut() {
            Some(file) => match file.write_all(bytes) {
                Ok(()) => Some(bytes.len() as u64),
                Err(err) => {
                    self.write_failures.record_and_warn(|count| {
                        warn!("Rotator writer: {count} record(s) failed to write: {err}");
                    });
                    None
                }
            },
            None => {
                self.discarded.record_and_warn(|count| {
                    warn!("Rotator writer: {count} record(s) discarded; no active file is open");
                });
                None
            }
        };

        let mut active = self.active.lock();
        if let Some(len) = written {
            active.record_written(len);
        }
        if !active.exceeds(self.size_limit_bytes) {
            return;
        }
        let size = active.bytes_written();
        match rotate(&mut self.file, &mut active) {
            RotationOutcome::Rotated { slot } => {
                debug!(
                    "Rotator writer: rotated {} ({}) to {}",
                    active.path().display(),
                    format_size(size),
                    slot.display()
                );
            }
            RotationOutcome::RenameFailed => {
                debug!("Rotator writer: rotation will be retried after the next record");
            }
            RotationOutcome::ReopenFailed => {
                debug!("Rotator writer: the next record will retry opening the active file");
            }
        }
    }

    fn sync(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(err) = file.flush().and_then(|()| file.sync_all()) {
                warn!("Rotator writer: flush error: {err}");
            }
        }
    }

    fn drain(mut self) {
        self.sync();
        self.file.take();
        self.write_failures.flush(|count| {
            warn!("Rotator writer: {count} record(s) failed to write before shutdown");
        });
        self.discarded.flush(|count| {
            warn!("Rotator writer: {count} record(s) discarded before shutdown");
        });
        info!(
            "Rotator writer: stopped appending to {}",
            self.active.lock().path().display()
        );
    }
}

/// Spawn the writer thread.
///
/// The thread opens `path`, the active path captured by the starter, and
/// reports the outcome over `ready_tx` before it consumes anything.
/// `ready_tx` should be a rendezvous channel so that a starter which gave up
/// waiting makes the send fail.
pub(crate) fn spawn_worker(
    rx: Receiver<Command>,
    path: PathBuf,
    active: Arc<Mutex<ActiveFile>>,
    size_limit_bytes: u64,
    ready_tx: Sender<io::Result<()>>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.into())
        .spawn(move || {
            let Some(mut writer) = ActiveWriter::initialise(&path, active, size_limit_bytes, &ready_tx)
            else {
                return;
            };
            drop(ready_tx);
            writer.run(&rx);
            writer.drain();
        })
}
