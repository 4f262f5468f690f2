//! Overflow policy parsing helpers.
//!
//! Shared by the INI loader and any caller that accepts the policy as text,
//! so the accepted spellings stay identical everywhere.

use std::time::Duration;

use thiserror::Error;

use super::{DEFAULT_WRITE_TIMEOUT, OverflowPolicy};

/// Error returned for an unrecognised overflow policy string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyParseError {
    #[error("timeout must be a positive integer (N in 'timeout:N')")]
    InvalidTimeout,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid overflow policy '{0}'. Valid options are: drop, block, timeout, timeout:N")]
    Unknown(String),
}

/// Parses a policy string into an [`OverflowPolicy`].
///
/// # Accepted input formats
/// - "drop": Reject new records when the queue is full.
/// - "block": Block until space is available.
/// - "timeout": Wait up to the default ten seconds.
/// - "timeout:N": Wait up to N milliseconds (N is a positive integer).
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use logrotate::config::{parse_policy_string, OverflowPolicy};
///
/// assert_eq!(parse_policy_string("drop").unwrap(), OverflowPolicy::Drop);
/// assert_eq!(
///     parse_policy_string("timeout:1000").unwrap(),
///     OverflowPolicy::Timeout(Duration::from_secs(1))
/// );
/// ```
pub fn parse_policy_string(policy: &str) -> Result<OverflowPolicy, PolicyParseError> {
    let normalized = policy.trim().to_ascii_lowercase();

    if let Some(rest) = normalized.strip_prefix("timeout:") {
        let ms: i64 = rest
            .trim()
            .parse()
            .map_err(|_| PolicyParseError::InvalidTimeout)?;
        if ms <= 0 {
            return Err(PolicyParseError::ZeroTimeout);
        }
        return Ok(OverflowPolicy::Timeout(Duration::from_millis(ms as u64)));
    }

    match normalized.as_str() {
        "drop" => Ok(OverflowPolicy::Drop),
        "block" => Ok(OverflowPolicy::Block),
        "timeout" => Ok(OverflowPolicy::Timeout(DEFAULT_WRITE_TIMEOUT)),
        _ => Err(PolicyParseError::Unknown(normalized)),
    }
}
