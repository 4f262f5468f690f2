//! Human-readable byte sizes.
//!
//! A size expression is a number followed by an optional unit, for example
//! `"10"`, `"100 KB"`, `"10 kib"` or `"1.5 MiB"`. SI units (`k`, `kb`, `m`,
//! `mb`, ...) scale by powers of 1000 and IEC units (`ki`, `kib`, `mi`, `mib`,
//! ...) by powers of 1024. Units are case-insensitive, whitespace between the
//! number and unit is ignored and `,` may be used as a digit separator.

use std::num::IntErrorKind;

use thiserror::Error;

/// Reasons a size expression can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeParseError {
    #[error("size expression is empty")]
    Empty,
    #[error("invalid size number in {0:?}")]
    InvalidNumber(String),
    #[error("unhandled size unit {0:?}")]
    UnknownUnit(String),
    #[error("size {0:?} does not fit in 64 bits")]
    Overflow(String),
}

const IEC_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

fn unit_multiplier(unit: &str) -> Option<u64> {
    let multiplier = match unit {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "ki" | "kib" => 1 << 10,
        "m" | "mb" => 1_000_000,
        "mi" | "mib" => 1 << 20,
        "g" | "gb" => 1_000_000_000,
        "gi" | "gib" => 1 << 30,
        "t" | "tb" => 1_000_000_000_000,
        "ti" | "tib" => 1 << 40,
        "p" | "pb" => 1_000_000_000_000_000,
        "pi" | "pib" => 1 << 50,
        "e" | "eb" => 1_000_000_000_000_000_000,
        "ei" | "eib" => 1 << 60,
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a size expression into an exact byte count.
///
/// Integer amounts are computed exactly; fractional amounts are scaled in
/// floating point and truncated towards zero.
///
/// # Errors
/// Returns a [`SizeParseError`] for empty input, a malformed number, an
/// unknown unit or a result larger than `u64::MAX`.
///
/// # Examples
/// ```
/// use logrotate::size::parse_size;
///
/// assert_eq!(parse_size("10").unwrap(), 10);
/// assert_eq!(parse_size("100 KB").unwrap(), 100_000);
/// assert_eq!(parse_size("100 mib").unwrap(), 104_857_600);
/// assert!(parse_size("100 mmmKB").is_err());
/// ```
pub fn parse_size(input: &str) -> Result<u64, SizeParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SizeParseError::Empty);
    }

    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let number: String = number.chars().filter(|c| *c != ',').collect();
    let amount = parse_amount(&number).ok_or_else(|| match number.parse::<u64>() {
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => {
            SizeParseError::Overflow(trimmed.into())
        }
        _ => SizeParseError::InvalidNumber(trimmed.into()),
    })?;

    let unit = unit.trim().to_ascii_lowercase();
    let multiplier = unit_multiplier(&unit).ok_or(SizeParseError::UnknownUnit(unit))?;

    match amount {
        Amount::Whole(whole) => whole
            .checked_mul(multiplier)
            .ok_or_else(|| SizeParseError::Overflow(trimmed.into())),
        Amount::Fraction(value) => {
            let bytes = value * multiplier as f64;
            if !bytes.is_finite() || bytes >= u64::MAX as f64 {
                return Err(SizeParseError::Overflow(trimmed.into()));
            }
            Ok(bytes as u64)
        }
    }
}

enum Amount {
    Whole(u64),
    Fraction(f64),
}

fn parse_amount(number: &str) -> Option<Amount> {
    if number.contains('.') {
        number.parse().ok().map(Amount::Fraction)
    } else {
        number.parse().ok().map(Amount::Whole)
    }
}

/// Render a byte count with the largest IEC unit that keeps it at or above 1.
///
/// Whole values print without decimals (`"100 MiB"`), others with one
/// (`"1.5 KiB"`).
pub fn format_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < IEC_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }
    if scaled.fract() == 0.0 {
        format!("{scaled:.0} {}", IEC_UNITS[unit])
    } else {
        format!("{scaled:.1} {}", IEC_UNITS[unit])
    }
}
