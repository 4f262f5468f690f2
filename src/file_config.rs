//! Loading rotator settings from INI files.
//!
//! Settings live in a `[rotator]` section:
//!
//! ```ini
//! [rotator]
//! size_limit = 10 kib
//! max_files = 2
//! path = /var/log/app/e.log
//! ; optional
//! capacity = 10
//! policy = timeout:10000
//! start_timeout_ms = 5000
//! ```
//!
//! Parsing is delegated to `rust-ini`; this module only maps keys onto
//! [`RotatorConfig`] and [`QueueConfig`].

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use ini::{Ini, Properties};
use thiserror::Error;

use crate::{
    Rotator,
    config::{PolicyParseError, QueueConfig, RotatorConfig, parse_policy_string},
    error::RotatorError,
    size::{SizeParseError, parse_size},
};

/// Name of the INI section holding rotator settings.
pub const ROTATOR_SECTION: &str = "rotator";

/// Errors raised while loading an INI configuration.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is an empty file", .0.display())]
    Empty(PathBuf),
    #[error("invalid INI: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("missing [rotator] section")]
    MissingSection,
    #[error("missing required key '{0}' in [rotator]")]
    MissingKey(&'static str),
    #[error("invalid value {value:?} for '{key}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid size_limit: {0}")]
    Size(#[from] SizeParseError),
    #[error(transparent)]
    Policy(#[from] PolicyParseError),
    #[error(transparent)]
    Config(#[from] RotatorError),
}

/// Both configuration records read from one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RotatorSettings {
    pub rotator: RotatorConfig,
    pub queue: QueueConfig,
}

impl RotatorSettings {
    /// Build a stopped rotator from these settings.
    pub fn into_rotator(self) -> Result<Rotator, RotatorError> {
        Rotator::with_config(self.rotator, self.queue)
    }
}

/// Read and parse the INI file at `path`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<RotatorSettings, ConfigFileError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(ConfigFileError::Empty(path.to_path_buf()));
    }
    parse_settings(&text)
}

/// Parse INI text holding a `[rotator]` section.
pub fn parse_settings(text: &str) -> Result<RotatorSettings, ConfigFileError> {
    let ini = Ini::load_from_str(text)?;
    let section = ini
        .section(Some(ROTATOR_SECTION))
        .ok_or(ConfigFileError::MissingSection)?;

    let size_limit = parse_size(required(section, "size_limit")?)?;
    let max_files =
        parse_number(section, "max_files")?.ok_or(ConfigFileError::MissingKey("max_files"))?;
    let rotator = RotatorConfig::new(size_limit, max_files, required(section, "path")?)?;

    let mut queue = QueueConfig::default();
    if let Some(capacity) = parse_number(section, "capacity")? {
        queue.capacity = capacity;
    }
    if let Some(policy) = section.get("policy") {
        queue.overflow_policy = parse_policy_string(policy)?;
    }
    if let Some(ms) = parse_number::<u64>(section, "start_timeout_ms")? {
        queue.start_timeout = Duration::from_millis(ms);
    }
    queue.validate()?;

    Ok(RotatorSettings { rotator, queue })
}

fn required<'a>(section: &'a Properties, key: &'static str) -> Result<&'a str, ConfigFileError> {
    section
        .get(key)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigFileError::MissingKey(key))
}

fn parse_number<T>(section: &Properties, key: &'static str) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    section
        .get(key)
        .map(|value| {
            value.parse().map_err(|err: T::Err| ConfigFileError::InvalidValue {
                key,
                value: value.to_owned(),
                reason: err.to_string(),
            })
        })
        .transpose()
}
