//! Size-based rotating log sink.
//!
//! A [`Rotator`] accepts byte records from any number of threads, queues
//! them on a bounded hand-off queue and lets a single background writer
//! append them to the active file. Once the active file holds more than the
//! configured limit it is renamed to `<prefix>.<index>` and a fresh file is
//! opened; indices are recycled so at most `max_rotated_files` rotated files
//! are kept.
//!
//! ```no_run
//! use std::io::Write;
//! use logrotate::Rotator;
//!
//! let rotator = Rotator::new();
//! rotator.configure("10 kib", 2, "e.log")?;
//! rotator.start()?;
//! for i in 0..100 {
//!     writeln!(&rotator, "log line {i}")?;
//! }
//! rotator.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod error;
pub mod file_config;
#[cfg(feature = "log-compat")]
pub mod log_compat;
mod rate_limited_warner;
pub mod ring;
pub mod rotator;
pub mod size;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_START_TIMEOUT, DEFAULT_WRITE_TIMEOUT, OverflowPolicy,
    PolicyParseError, QueueConfig, RotatorConfig, parse_policy_string,
};
pub use error::RotatorError;
pub use file_config::{ConfigFileError, RotatorSettings, load_settings, parse_settings};
#[cfg(feature = "log-compat")]
pub use log_compat::{RotatorLogAdapter, install_global_logger};
pub use ring::{RotationRing, slot_path};
pub use rotator::{ActiveFileState, FLUSH_ACK_TIMEOUT, Lifecycle, Rotator};
pub use size::{SizeParseError, format_size, parse_size};
