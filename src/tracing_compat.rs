//! `tracing-subscriber` writer backed by a [`Rotator`].
//!
//! The fmt layer renders each event into one buffer before writing it, so
//! every event becomes a single queued record.

use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

use crate::Rotator;

/// Hands out `&Rotator` writers to `tracing_subscriber::fmt`.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use logrotate::{Rotator, tracing_compat::RotatorMakeWriter};
///
/// let rotator = Arc::new(Rotator::new());
/// rotator.start()?;
/// tracing_subscriber::fmt()
///     .with_ansi(false)
///     .with_writer(RotatorMakeWriter::new(Arc::clone(&rotator)))
///     .init();
/// # Ok::<(), logrotate::RotatorError>(())
/// ```
#[derive(Clone)]
pub struct RotatorMakeWriter {
    rotator: Arc<Rotator>,
}

impl RotatorMakeWriter {
    pub fn new(rotator: Arc<Rotator>) -> Self {
        Self { rotator }
    }
}

impl<'a> MakeWriter<'a> for RotatorMakeWriter {
    type Writer = &'a Rotator;

    fn make_writer(&'a self) -> Self::Writer {
        &self.rotator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QueueConfig, RotatorConfig};

    #[test]
    fn events_are_written_to_the_active_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config =
            RotatorConfig::new(1024, 2, dir.path().join("trace.log")).expect("valid config");
        let rotator = Arc::new(
            Rotator::with_config(config, QueueConfig::default()).expect("build rotator"),
        );
        rotator.start().expect("start");

        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(RotatorMakeWriter::new(Arc::clone(&rotator)))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(answer = 42, "hello from tracing");
        });
        rotator.stop().expect("stop");

        let contents =
            std::fs::read_to_string(dir.path().join("trace.log")).expect("read active file");
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("hello from tracing"), "{contents}");
        assert!(contents.contains("answer=42"), "{contents}");
    }
}
