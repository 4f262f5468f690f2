//! Configuration structures for [`Rotator`](crate::Rotator).
//!
//! [`RotatorConfig`] describes what is written where: the size limit that
//! triggers rotation, the active file path and how many rotated files are
//! kept. [`QueueConfig`] tunes the hand-off queue between producers and the
//! writer thread. Both are plain records validated before a rotator accepts
//! them.

pub mod policy;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::RotatorError,
    size::{self, parse_size},
};

pub use policy::{PolicyParseError, parse_policy_string};

/// Default bounded queue capacity between producers and the writer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;
/// How long `write` waits for queue space under the default policy.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// How long `start` waits for the writer to open the active file.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(5);
/// Active file path used until a rotator is configured.
pub const DEFAULT_FILE_PREFIX: &str = "logfile";
/// Number of rotated files kept by default.
pub const DEFAULT_MAX_ROTATED_FILES: usize = 5;
/// Default size limit, `"100 mib"`.
pub const DEFAULT_SIZE_LIMIT_BYTES: u64 = 100 * 1024 * 1024;

/// Determines how `write` reacts when the hand-off queue is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Reject the record immediately.
    Drop,
    /// Wait until space becomes available.
    Block,
    /// Wait up to the specified duration before rejecting the record.
    Timeout(Duration),
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        Self::Timeout(DEFAULT_WRITE_TIMEOUT)
    }
}

/// Size limit, active file path and ring size for a rotator.
///
/// When deserialising, `size_limit_bytes` accepts either an integer or a
/// human-readable size such as `"10 kib"`. Missing fields take their
/// defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatorConfig {
    /// The active file rotates once it holds more than this many bytes.
    #[serde(deserialize_with = "deserialize_size")]
    pub size_limit_bytes: u64,
    /// Path of the active file; rotated files append `.<index>`.
    pub file_prefix: PathBuf,
    /// Number of rotated files kept before the oldest is overwritten.
    pub max_rotated_files: usize,
}

impl RotatorConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns [`RotatorError::InvalidConfig`] when `max_rotated_files` is zero
    /// or the prefix is empty.
    pub fn new(
        size_limit_bytes: u64,
        max_rotated_files: usize,
        file_prefix: impl Into<PathBuf>,
    ) -> Result<Self, RotatorError> {
        let config = Self {
            size_limit_bytes,
            file_prefix: file_prefix.into(),
            max_rotated_files,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a validated configuration from a human-readable size limit.
    ///
    /// # Examples
    /// ```
    /// use logrotate::RotatorConfig;
    ///
    /// let config = RotatorConfig::from_human("10 kib", 2, "e.log").unwrap();
    /// assert_eq!(config.size_limit_bytes, 10_240);
    /// assert!(RotatorConfig::from_human("10 kib", 0, "e.log").is_err());
    /// ```
    pub fn from_human(
        size_limit: &str,
        max_rotated_files: usize,
        file_prefix: impl Into<PathBuf>,
    ) -> Result<Self, RotatorError> {
        Self::new(parse_size(size_limit)?, max_rotated_files, file_prefix)
    }

    /// Check the invariants a rotator relies on.
    pub fn validate(&self) -> Result<(), RotatorError> {
        if self.max_rotated_files == 0 {
            return Err(RotatorError::InvalidConfig(
                "max_rotated_files must be greater than zero".into(),
            ));
        }
        if self.file_prefix.as_os_str().is_empty() {
            return Err(RotatorError::InvalidConfig(
                "file_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Path of the active file.
    pub fn active_path(&self) -> &Path {
        &self.file_prefix
    }
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            size_limit_bytes: DEFAULT_SIZE_LIMIT_BYTES,
            file_prefix: PathBuf::from(DEFAULT_FILE_PREFIX),
            max_rotated_files: DEFAULT_MAX_ROTATED_FILES,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Bytes(u64),
    Human(String),
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Bytes(bytes) => Ok(bytes),
        SizeRepr::Human(text) => size::parse_size(&text).map_err(serde::de::Error::custom),
    }
}

/// Options for the hand-off queue and writer start-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Bounded queue size for records waiting to be written.
    pub capacity: usize,
    /// Policy to apply when the queue is full.
    pub overflow_policy: OverflowPolicy,
    /// How long `start` waits for the writer to become ready.
    pub start_timeout: Duration,
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), RotatorError> {
        if self.capacity == 0 {
            return Err(RotatorError::InvalidConfig(
                "capacity must be greater than zero".into(),
            ));
        }
        if self.start_timeout.is_zero() {
            return Err(RotatorError::InvalidConfig(
                "start_timeout must be greater than zero".into(),
            ));
        }
        if let OverflowPolicy::Timeout(dur) = self.overflow_policy {
            if dur.is_zero() {
                return Err(RotatorError::InvalidConfig(
                    "overflow timeout must be greater than zero".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_documented_values() {
        let config = RotatorConfig::default();
        assert_eq!(config.file_prefix, PathBuf::from("logfile"));
        assert_eq!(config.size_limit_bytes, 104_857_600);
        assert_eq!(config.max_rotated_files, 5);
        assert_eq!(
            parse_size("100 mib").expect("default size parses"),
            DEFAULT_SIZE_LIMIT_BYTES
        );

        let queue = QueueConfig::default();
        assert_eq!(queue.capacity, 10);
        assert_eq!(
            queue.overflow_policy,
            OverflowPolicy::Timeout(Duration::from_secs(10))
        );
    }

    #[test]
    fn from_human_parses_size() {
        let config = RotatorConfig::from_human("100 KB", 6, "somelog").unwrap();
        assert_eq!(config.size_limit_bytes, 100_000);
        assert_eq!(config.max_rotated_files, 6);
        assert_eq!(config.active_path(), Path::new("somelog"));
    }

    #[test]
    fn from_human_reports_parse_errors() {
        let err = RotatorConfig::from_human("100 mmmKB", 6, "somelog").unwrap_err();
        assert!(matches!(err, RotatorError::ConfigParse(_)), "{err:?}");
    }

    #[rstest]
    #[case::zero_files(10, 0, "log")]
    #[case::empty_prefix(10, 2, "")]
    fn new_rejects_invalid_fields(
        #[case] size: u64,
        #[case] files: usize,
        #[case] prefix: &str,
    ) {
        let err = RotatorConfig::new(size, files, prefix).unwrap_err();
        assert!(matches!(err, RotatorError::InvalidConfig(_)), "{err:?}");
    }

    #[rstest]
    #[case::zero_capacity(QueueConfig { capacity: 0, ..QueueConfig::default() })]
    #[case::zero_start_timeout(QueueConfig { start_timeout: Duration::ZERO, ..QueueConfig::default() })]
    #[case::zero_overflow_timeout(QueueConfig {
        overflow_policy: OverflowPolicy::Timeout(Duration::ZERO),
        ..QueueConfig::default()
    })]
    fn queue_config_rejects_zero_values(#[case] config: QueueConfig) {
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserialises_human_and_numeric_sizes() {
        let human: RotatorConfig = serde_json::from_str(
            r#"{"size_limit_bytes": "10 kib", "file_prefix": "e.log", "max_rotated_files": 2}"#,
        )
        .unwrap();
        assert_eq!(human, RotatorConfig::new(10_240, 2, "e.log").unwrap());

        let numeric: RotatorConfig =
            serde_json::from_str(r#"{"size_limit_bytes": 42}"#).unwrap();
        assert_eq!(numeric.size_limit_bytes, 42);
        assert_eq!(numeric.file_prefix, PathBuf::from(DEFAULT_FILE_PREFIX));
    }

    #[test]
    fn deserialise_rejects_bad_size() {
        let err = serde_json::from_str::<RotatorConfig>(r#"{"size_limit_bytes": "ten"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid size number"), "{err}");
    }
}
