//! Public facade of the rotating log sink.
//!
//! [`Rotator`] accepts byte records from any number of threads and hands them
//! to a single background writer over a bounded queue. The writer appends to
//! the active file and rotates it into a fixed ring of numbered slots once it
//! grows past the configured limit.
//!
//! State is split by resource: the lifecycle, configuration and worker handle
//! sit behind one control mutex; the active-file book-keeping has its own
//! mutex shared with the writer; the producer side of the queue sits behind a
//! read-write lock so `close` can disconnect it. Producers never touch the
//! control mutex.

mod active;
#[cfg(test)]
mod fresh_failure;
mod lifecycle;
mod worker;

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::{
    Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError, bounded,
};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

pub use active::ActiveFileState;
pub use lifecycle::Lifecycle;

use self::{
    active::ActiveFile,
    worker::{Command, spawn_worker},
};
use crate::{
    config::{OverflowPolicy, QueueConfig, RotatorConfig},
    error::RotatorError,
    rate_limited_warner::RateLimitedWarner,
    size::format_size,
};

/// How long `flush` waits for the writer's acknowledgement.
pub const FLUSH_ACK_TIMEOUT: Duration = Duration::from_secs(1);

/// Re-check interval for waits that must notice a dead writer or a closed
/// queue.
const LIVENESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Control {
    state: Lifecycle,
    config: RotatorConfig,
    worker: Option<JoinHandle<()>>,
}

/// Size-based rotating log sink.
///
/// Created stopped. Records written before [`start`](Self::start) wait in the
/// queue and are written once the writer runs; the same holds between
/// [`stop`](Self::stop) and a later `start`.
///
/// # Examples
/// ```no_run
/// use std::io::Write;
/// use logrotate::Rotator;
///
/// let rotator = Rotator::new();
/// rotator.configure("10 kib", 2, "e.log")?;
/// rotator.start()?;
/// writeln!(&rotator, "log line {}", 1)?;
/// rotator.stop()?;
/// rotator.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Rotator {
    tx: RwLock<Option<Sender<Command>>>,
    rx: Receiver<Command>,
    control: Mutex<Control>,
    active: Arc<Mutex<ActiveFile>>,
    queue_config: QueueConfig,
    saturation: RateLimitedWarner,
}

impl Rotator {
    /// Create a stopped rotator with default settings.
    ///
    /// The active file is `logfile`, rotation happens past 100 MiB and five
    /// rotated files are kept.
    pub fn new() -> Self {
        Self::build(RotatorConfig::default(), QueueConfig::default())
    }

    /// Create a stopped rotator with explicit settings.
    ///
    /// # Errors
    /// Returns [`RotatorError::InvalidConfig`] when either record fails
    /// validation.
    pub fn with_config(config: RotatorConfig, queue: QueueConfig) -> Result<Self, RotatorError> {
        config.validate()?;
        queue.validate()?;
        Ok(Self::build(config, queue))
    }

    fn build(config: RotatorConfig, queue_config: QueueConfig) -> Self {
        let (tx, rx) = bounded(queue_config.capacity);
        Self {
            tx: RwLock::new(Some(tx)),
            rx,
            active: Arc::new(Mutex::new(ActiveFile::new(&config))),
            control: Mutex::new(Control {
                state: Lifecycle::Stopped,
                config,
                worker: None,
            }),
            queue_config,
            saturation: RateLimitedWarner::default(),
        }
    }

    /// Queue a copy of `record` for the writer.
    ///
    /// Returns the record length once it is accepted into the queue, which
    /// does not mean it reached disk. Empty records are a no-op returning `0`.
    ///
    /// # Errors
    /// - [`RotatorError::QueueSaturated`] when the queue stays full for the
    ///   overflow policy's window (immediately under `Drop`).
    /// - [`RotatorError::Closed`] after [`close`](Self::close).
    pub fn write(&self, record: &[u8]) -> Result<usize, RotatorError> {
        if record.is_empty() {
            return Ok(0);
        }
        let tx = self.sender()?;
        self.enqueue(&tx, Command::Record(record.to_vec()))?;
        Ok(record.len())
    }

    fn sender(&self) -> Result<Sender<Command>, RotatorError> {
        self.tx.read().clone().ok_or(RotatorError::Closed)
    }

    fn enqueue(&self, tx: &Sender<Command>, cmd: Command) -> Result<(), RotatorError> {
        let result = match self.queue_config.overflow_policy {
            OverflowPolicy::Drop => tx.try_send(cmd).map_err(|err| match err {
                TrySendError::Full(_) => RotatorError::QueueSaturated(Duration::ZERO),
                TrySendError::Disconnected(_) => RotatorError::Closed,
            }),
            OverflowPolicy::Block => self.send_blocking(tx, cmd),
            OverflowPolicy::Timeout(dur) => tx.send_timeout(cmd, dur).map_err(|err| match err {
                SendTimeoutError::Timeout(_) => RotatorError::QueueSaturated(dur),
                SendTimeoutError::Disconnected(_) => RotatorError::Closed,
            }),
        };
        if matches!(result, Err(RotatorError::QueueSaturated(_))) {
            self.saturation.record_and_warn(|count| {
                warn!("Rotator: {count} record(s) rejected because the hand-off queue was full");
            });
        }
        result
    }

    /// Wait for queue space, giving up if the rotator is closed meanwhile.
    fn send_blocking(&self, tx: &Sender<Command>, mut cmd: Command) -> Result<(), RotatorError> {
        loop {
            match tx.send_timeout(cmd, LIVENESS_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.tx.read().is_none() {
                        return Err(RotatorError::Closed);
                    }
                    cmd = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(RotatorError::Closed),
            }
        }
    }

    /// Ask the writer to flush and sync the active file.
    ///
    /// Returns `true` when the writer acknowledges within
    /// [`FLUSH_ACK_TIMEOUT`]. Returns `false` when the rotator is not
    /// running, the request cannot be queued, or no acknowledgement arrives in
    /// time. Records queued ahead of the request are written first.
    pub fn flush(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Ok(tx) = self.sender() else {
            return false;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if self.enqueue(&tx, Command::Flush(ack_tx)).is_err() {
            return false;
        }
        ack_rx.recv_timeout(FLUSH_ACK_TIMEOUT).is_ok()
    }

    /// Start the writer thread.
    ///
    /// A no-op when already running. Blocks until the writer has opened the
    /// active file, bounded by [`QueueConfig::start_timeout`].
    ///
    /// # Errors
    /// - [`RotatorError::Startup`] when the active file cannot be opened.
    /// - [`RotatorError::StartupTimeout`] when the writer does not report in
    ///   time; it is abandoned and exits without consuming records.
    /// - [`RotatorError::Busy`] during another transition.
    /// - [`RotatorError::Closed`] after [`close`](Self::close).
    pub fn start(&self) -> Result<(), RotatorError> {
        let (ready_rx, path) = {
            let mut control = self.control.lock();
            match control.state {
                Lifecycle::Running => return Ok(()),
                Lifecycle::Closed => return Err(RotatorError::Closed),
                state @ (Lifecycle::Starting | Lifecycle::Stopping) => {
                    return Err(RotatorError::Busy(state));
                }
                Lifecycle::Stopped => {}
            }
            let path = control.config.active_path().to_path_buf();
            let (ready_tx, ready_rx) = bounded(0);
            let handle = spawn_worker(
                self.rx.clone(),
                path.clone(),
                Arc::clone(&self.active),
                control.config.size_limit_bytes,
                ready_tx,
            )
            .map_err(RotatorError::Spawn)?;
            control.worker = Some(handle);
            control.state = Lifecycle::Starting;
            (ready_rx, path)
        };

        let timeout = self.queue_config.start_timeout;
        let outcome = ready_rx.recv_timeout(timeout);
        drop(ready_rx);

        let mut control = self.control.lock();
        match outcome {
            Ok(Ok(())) => {
                control.state = Lifecycle::Running;
                info!(
                    "Rotator: writing to {} (limit {}, {} rotated file(s))",
                    path.display(),
                    format_size(control.config.size_limit_bytes),
                    control.config.max_rotated_files
                );
                Ok(())
            }
            Ok(Err(source)) => {
                control.state = Lifecycle::Stopped;
                join_worker(control.worker.take());
                Err(RotatorError::Startup { path, source })
            }
            Err(RecvTimeoutError::Timeout) => {
                control.state = Lifecycle::Stopped;
                control.worker.take();
                warn!(
                    "Rotator: writer for {} did not become ready within {timeout:?}",
                    path.display()
                );
                Err(RotatorError::StartupTimeout(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => {
                control.state = Lifecycle::Stopped;
                join_worker(control.worker.take());
                Err(RotatorError::Startup {
                    path,
                    source: io::Error::other("writer exited before reporting readiness"),
                })
            }
        }
    }

    /// Stop the writer after it drains every record queued so far.
    ///
    /// A no-op unless running. Records written after the shutdown request
    /// stay queued for the next [`start`](Self::start).
    ///
    /// # Errors
    /// [`RotatorError::Busy`] during another transition.
    pub fn stop(&self) -> Result<(), RotatorError> {
        let handle = {
            let mut control = self.control.lock();
            match control.state {
                Lifecycle::Running => {}
                Lifecycle::Stopped | Lifecycle::Closed => return Ok(()),
                state @ (Lifecycle::Starting | Lifecycle::Stopping) => {
                    return Err(RotatorError::Busy(state));
                }
            }
            control.state = Lifecycle::Stopping;
            control.worker.take()
        };

        if let Some(handle) = &handle {
            self.send_shutdown(handle);
        }
        join_worker(handle);

        self.control.lock().state = Lifecycle::Stopped;
        debug!("Rotator: stopped");
        Ok(())
    }

    /// Queue the shutdown sentinel, giving up if the writer has already died.
    fn send_shutdown(&self, handle: &JoinHandle<()>) {
        let Some(tx) = self.tx.read().clone() else {
            return;
        };
        let mut cmd = Command::Shutdown;
        loop {
            match tx.send_timeout(cmd, LIVENESS_POLL_INTERVAL) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if handle.is_finished() {
                        warn!("Rotator: writer exited before accepting shutdown");
                        return;
                    }
                    cmd = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return,
            }
        }
    }

    /// Close the rotator for good.
    ///
    /// Stops the writer first when it is running, so queued records are
    /// written. Afterwards `write` fails with [`RotatorError::Closed`] and any
    /// records still queued are discarded. Idempotent.
    ///
    /// # Errors
    /// [`RotatorError::Busy`] during another transition.
    pub fn close(&self) -> Result<(), RotatorError> {
        loop {
            self.stop()?;
            let mut control = self.control.lock();
            match control.state {
                Lifecycle::Closed => return Ok(()),
                Lifecycle::Stopped => {}
                // Another thread moved on between `stop` and re-acquiring the
                // lock; `stop` reports it as running or busy.
                Lifecycle::Running | Lifecycle::Starting | Lifecycle::Stopping => continue,
            }
            self.tx.write().take();
            control.state = Lifecycle::Closed;

            // Left in place: draining would free space for a blocked producer.
            let discarded = self.rx.len();
            if discarded > 0 {
                warn!("Rotator: closed with {discarded} queued command(s) left unwritten");
            }
            self.saturation.flush(|count| {
                warn!("Rotator: {count} record(s) rejected because the hand-off queue was full");
            });
            info!("Rotator: closed");
            return Ok(());
        }
    }

    /// Parse and apply a new configuration.
    ///
    /// `size_limit` is a human-readable size such as `"10 kib"`. All fields
    /// are applied together or not at all.
    ///
    /// # Errors
    /// - [`RotatorError::ConfigParse`] for a malformed size.
    /// - [`RotatorError::InvalidConfig`] for zero files or an empty prefix.
    /// - [`RotatorError::NotStopped`] unless the rotator is stopped.
    pub fn configure(
        &self,
        size_limit: &str,
        max_rotated_files: usize,
        path_prefix: impl Into<PathBuf>,
    ) -> Result<(), RotatorError> {
        let config = RotatorConfig::from_human(size_limit, max_rotated_files, path_prefix)?;
        self.reconfigure(config)
    }

    /// Apply an already-built configuration. See [`configure`](Self::configure).
    pub fn reconfigure(&self, config: RotatorConfig) -> Result<(), RotatorError> {
        config.validate()?;
        let mut control = self.control.lock();
        if control.state != Lifecycle::Stopped {
            return Err(RotatorError::NotStopped {
                action: "reconfigure",
                state: control.state,
            });
        }
        self.active.lock().retarget(&config);
        debug!(
            "Rotator: configured {} (limit {}, {} rotated file(s))",
            config.file_prefix.display(),
            format_size(config.size_limit_bytes),
            config.max_rotated_files
        );
        control.config = config;
        Ok(())
    }

    pub fn state(&self) -> Lifecycle {
        self.control.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == Lifecycle::Running
    }

    pub fn config(&self) -> RotatorConfig {
        self.control.lock().config.clone()
    }

    pub fn queue_config(&self) -> &QueueConfig {
        &self.queue_config
    }

    /// Snapshot of the active file's path, rotation index and size.
    pub fn active_file(&self) -> ActiveFileState {
        self.active.lock().snapshot()
    }

    /// Number of commands waiting in the hand-off queue.
    pub fn queued(&self) -> usize {
        self.rx.len()
    }
}

fn join_worker(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if handle.join().is_err() {
            warn!("Rotator: writer thread panicked");
        }
    }
}

impl Default for Rotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Rotator {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("Rotator: close on drop failed: {err}");
        }
    }
}

impl Write for &Rotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Rotator::write(*self, buf).map_err(io::Error::from)
    }

    /// Succeeds trivially while stopped; otherwise waits for the writer.
    fn flush(&mut self) -> io::Result<()> {
        if !self.is_running() || Rotator::flush(*self) {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "writer did not acknowledge flush",
            ))
        }
    }
}

impl Write for Rotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink: &Rotator = self;
        Write::write(&mut sink, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut sink: &Rotator = self;
        Write::flush(&mut sink)
    }
}

#[cfg(test)]
mod tests;
