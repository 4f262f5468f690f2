//! Compatibility bridge for the Rust `log` crate.
//!
//! [`RotatorLogAdapter`] implements `log::Log` by formatting each record as
//! one line and queueing it on a [`Rotator`]. Records emitted by this crate
//! are skipped so that the writer's own diagnostics never feed back into the
//! file it is writing.

use std::{
    fmt::Write as _,
    sync::{Arc, OnceLock},
};

use chrono::{SecondsFormat, Utc};
use log::{LevelFilter, Metadata, Record};

use crate::Rotator;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Adapter implementing the Rust `log::Log` trait on top of a rotator.
pub struct RotatorLogAdapter {
    rotator: Arc<Rotator>,
    level: LevelFilter,
}

impl RotatorLogAdapter {
    /// Forward every level to `rotator`.
    pub fn new(rotator: Arc<Rotator>) -> Self {
        Self {
            rotator,
            level: LevelFilter::Trace,
        }
    }

    /// Only forward records at or above `level`.
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn rotator(&self) -> &Arc<Rotator> {
        &self.rotator
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Render `record` as `"<RFC3339 UTC> <LEVEL> <target>: <message>\n"`.
pub(crate) fn format_line(record: &Record<'_>) -> String {
    let mut line = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let _ = writeln!(
        line,
        " {} {}: {}",
        record.level(),
        record.target(),
        record.args()
    );
    line
}

impl log::Log for RotatorLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level && !is_own_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Err(err) = self.rotator.write(format_line(record).as_bytes()) {
            eprintln!("logrotate: failed to queue log record: {err}");
        }
    }

    fn flush(&self) {
        self.rotator.flush();
    }
}

static INSTALL_RESULT: OnceLock<bool> = OnceLock::new();

/// Install a [`RotatorLogAdapter`] as the global Rust logger.
///
/// Returns `true` on success. When a different global logger is already set,
/// installation fails and `false` is returned. Subsequent calls return the
/// cached outcome and ignore their arguments.
pub fn install_global_logger(rotator: Arc<Rotator>, level: LevelFilter) -> bool {
    *INSTALL_RESULT.get_or_init(|| {
        let adapter = RotatorLogAdapter::new(rotator).with_level(level);
        if log::set_boxed_logger(Box::new(adapter)).is_err() {
            return false;
        }
        log::set_max_level(level);
        true
    })
}
