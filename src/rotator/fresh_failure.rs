//! Forced failures for opening a fresh active file, used by tests.
//!
//! Entries are keyed by path so tests running in parallel on different
//! temporary directories do not consume each other's failures.

use std::{
    io,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;

static FORCED: Mutex<Vec<(PathBuf, usize)>> = Mutex::new(Vec::new());

/// Consume one forced failure for `path`, if any remain.
pub(crate) fn take(path: &Path) -> Option<io::Error> {
    let mut forced = FORCED.lock();
    let index = forced.iter().position(|(forced_path, _)| forced_path == path)?;
    let remaining = &mut forced[index].1;
    *remaining -= 1;
    if *remaining == 0 {
        forced.swap_remove(index);
    }
    Some(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("forced fresh-open failure for {}", path.display()),
    ))
}

/// Make the next `count` fresh opens of `path` fail until the guard drops.
pub(crate) fn fail_fresh_opens(
    path: impl Into<PathBuf>,
    count: usize,
) -> ForcedFreshFailureGuard {
    let path = path.into();
    let mut forced = FORCED.lock();
    forced.retain(|(forced_path, _)| *forced_path != path);
    if count > 0 {
        forced.push((path.clone(), count));
    }
    ForcedFreshFailureGuard { path }
}

pub(crate) struct ForcedFreshFailureGuard {
    path: PathBuf,
}

impl Drop for ForcedFreshFailureGuard {
    fn drop(&mut self) {
        FORCED
            .lock()
            .retain(|(forced_path, _)| *forced_path != self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_consumed_per_path() {
        let _guard = fail_fresh_opens("a.log", 2);
        assert!(take(Path::new("b.log")).is_none());
        assert!(take(Path::new("a.log")).is_some());
        assert!(take(Path::new("a.log")).is_some());
        assert!(take(Path::new("a.log")).is_none());
    }

    #[test]
    fn dropping_the_guard_clears_remaining_failures() {
        let guard = fail_fresh_opens("c.log", 3);
        assert!(take(Path::new("c.log")).is_some());
        drop(guard);
        assert!(take(Path::new("c.log")).is_none());
    }
}
