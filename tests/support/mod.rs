//! Fixtures shared by the integration and property tests.

#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use logrotate::{OverflowPolicy, QueueConfig, Rotator, RotatorConfig};
use rstest::fixture;
use tempfile::TempDir;

/// Return a fresh temporary directory that is removed on drop.
#[fixture]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Active file path inside `dir`.
pub fn active_path(dir: &TempDir) -> PathBuf {
    dir.path().join("logfile")
}

/// A stopped rotator writing to `logfile` inside `dir` with the default queue.
pub fn rotator_in(dir: &TempDir, size_limit: &str, files: usize) -> Rotator {
    let config =
        RotatorConfig::from_human(size_limit, files, active_path(dir)).expect("valid config");
    Rotator::with_config(config, QueueConfig::default()).expect("build rotator")
}

/// Like [`rotator_in`] but waiting forever for queue space.
pub fn blocking_rotator_in(dir: &TempDir, size_limit: &str, files: usize) -> Rotator {
    let config =
        RotatorConfig::from_human(size_limit, files, active_path(dir)).expect("valid config");
    let queue = QueueConfig {
        overflow_policy: OverflowPolicy::Block,
        start_timeout: Duration::from_secs(5),
        ..QueueConfig::default()
    };
    Rotator::with_config(config, queue).expect("build rotator")
}

/// File contents, or an empty string when the file does not exist.
pub fn read_or_empty(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// Names of every file in `dir`, sorted.
pub fn file_names(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .expect("list temp dir")
        .map(|entry| {
            entry
                .expect("read dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
