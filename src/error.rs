//! Errors surfaced by [`Rotator`](crate::Rotator) operations.
//!
//! Producers only ever see [`RotatorError::QueueSaturated`] or
//! [`RotatorError::Closed`] from `write`. File-system failures inside the
//! writer thread are logged and never reach this type once a record has been
//! accepted.

use std::{io, path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{rotator::Lifecycle, size::SizeParseError};

/// Errors returned by the rotator facade.
#[derive(Debug, Error)]
pub enum RotatorError {
    /// The hand-off queue stayed full for the whole overflow window.
    #[error("hand-off queue stayed full for {0:?}; record rejected")]
    QueueSaturated(Duration),
    /// The rotator has been closed and accepts no further work.
    #[error("rotator is closed")]
    Closed,
    /// A human-readable size limit could not be parsed.
    #[error("invalid size limit: {0}")]
    ConfigParse(#[from] SizeParseError),
    /// A configuration value violates an invariant.
    #[error("invalid rotator configuration: {0}")]
    InvalidConfig(String),
    /// The operation requires a stopped rotator.
    #[error("rotator must be stopped to {action}; it is {state}")]
    NotStopped {
        action: &'static str,
        state: Lifecycle,
    },
    /// Another lifecycle transition is in progress.
    #[error("rotator is {0}; retry once the transition completes")]
    Busy(Lifecycle),
    /// The writer could not open the active file.
    #[error("failed to open active log file {}: {source}", .path.display())]
    Startup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The writer did not report readiness in time.
    #[error("writer did not become ready within {0:?}")]
    StartupTimeout(Duration),
    /// The writer thread could not be spawned.
    #[error("failed to spawn writer thread: {0}")]
    Spawn(#[source] io::Error),
}

impl From<RotatorError> for io::Error {
    fn from(err: RotatorError) -> Self {
        let kind = match &err {
            RotatorError::QueueSaturated(dur) if dur.is_zero() => io::ErrorKind::WouldBlock,
            RotatorError::QueueSaturated(_) | RotatorError::StartupTimeout(_) => {
                io::ErrorKind::TimedOut
            }
            RotatorError::Closed => io::ErrorKind::BrokenPipe,
            RotatorError::ConfigParse(_) | RotatorError::InvalidConfig(_) => {
                io::ErrorKind::InvalidInput
            }
            RotatorError::Startup { source, .. } | RotatorError::Spawn(source) => source.kind(),
            RotatorError::NotStopped { .. } | RotatorError::Busy(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
