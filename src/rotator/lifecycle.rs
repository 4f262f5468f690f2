//! Lifecycle states of a [`Rotator`](super::Rotator).

use std::fmt;

/// Where a rotator is in its start/stop/close cycle.
///
/// ```text
/// Stopped -> Starting -> Running -> Stopping -> Stopped
///    \___________________________________________/ -> Closed
/// ```
///
/// `Starting` and `Stopping` are transient: they cover the window in which the
/// facade waits on the writer thread without holding the control lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Stopped,
    Starting,
    Running,
    Stopping,
    /// Terminal: the producer side of the queue is disconnected.
    Closed,
}

impl Lifecycle {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
