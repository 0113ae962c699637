//! Signed nanosecond durations parsed from human-written strings.
//!
//! # Grammar
//! - Optional sign, then one or more `<number><unit>` pairs (`1h30m`, `-1.5s`)
//! - Units: `ns`, `us`/`µs`/`μs`, `ms`, `s`, `m`, `h`, `d` (24h)
//! - A bare `0` is the only unitless value accepted
//!
//! # Design Decisions
//! - Stored as `i64` nanoseconds; zero doubles as "unset"
//! - Serialized as an integer nanosecond count, deserialized from either
//!   an integer or a duration string

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors produced while parsing a duration string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration '{0}'")]
    Invalid(String),

    #[error("missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    #[error("duration '{0}' is out of range")]
    Overflow(String),
}

/// A signed span of time with nanosecond granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Duration(i64);

const SECOND: u64 = 1_000_000_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => SECOND,
        "m" => MINUTE,
        "h" => HOUR,
        "d" => 24 * HOUR,
        _ => return None,
    };
    Some(u128::from(nanos))
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_nanos(nanos: i64) -> Self {
        Duration(nanos)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Duration(secs.saturating_mul(SECOND as i64))
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert to a std duration; negative values have no std counterpart.
    pub fn to_std(self) -> Option<std::time::Duration> {
        u64::try_from(self.0).ok().map(std::time::Duration::from_nanos)
    }

    /// Parse a duration string such as `"1h30m"`, `"250ms"` or `"2d"`.
    pub fn parse(input: &str) -> Result<Self, DurationError> {
        let invalid = || DurationError::Invalid(input.to_string());
        let overflow = || DurationError::Overflow(input.to_string());

        let (negative, mut rest) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };
        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        if rest.is_empty() {
            return Err(invalid());
        }

        let limit = if negative {
            i64::MAX as u128 + 1
        } else {
            i64::MAX as u128
        };
        let mut total: u128 = 0;

        while !rest.is_empty() {
            let first = rest.as_bytes()[0];
            if !(first == b'.' || first.is_ascii_digit()) {
                return Err(invalid());
            }

            let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            let (int_part, after) = rest.split_at(int_len);
            rest = after;

            let mut frac_part = "";
            if let Some(after_dot) = rest.strip_prefix('.') {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                frac_part = &after_dot[..frac_len];
                rest = &after_dot[frac_len..];
            }
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid());
            }

            let unit_len = rest
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (unit, after) = rest.split_at(unit_len);
            rest = after;
            if unit.is_empty() {
                return Err(DurationError::MissingUnit(input.to_string()));
            }
            let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

            let whole: u128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| overflow())?
            };
            let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

            if !frac_part.is_empty() {
                // Digits beyond 18 are below nanosecond precision even for days.
                let digits = &frac_part[..frac_part.len().min(18)];
                let numerator: u128 = digits.parse().map_err(|_| invalid())?;
                let denominator = 10u128.pow(digits.len() as u32);
                nanos += numerator * scale / denominator;
            }

            total = total.checked_add(nanos).ok_or_else(overflow)?;
            if total > limit {
                return Err(overflow());
            }
        }

        let signed = if negative {
            -(total as i128)
        } else {
            total as i128
        };
        i64::try_from(signed).map(Duration).map_err(|_| overflow())
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Duration::parse(s)
    }
}

fn write_scaled(f: &mut fmt::Formatter<'_>, value: u64, scale: u64) -> fmt::Result {
    write!(f, "{}", value / scale)?;
    let frac = value % scale;
    if frac != 0 {
        let width = scale.ilog10() as usize;
        let digits = format!("{frac:0width$}");
        write!(f, ".{}", digits.trim_end_matches('0'))?;
    }
    Ok(())
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nanos = self.0.unsigned_abs();
        if nanos == 0 {
            return f.write_str("0s");
        }
        if self.0 < 0 {
            f.write_str("-")?;
        }

        if nanos < SECOND {
            let (unit, scale) = if nanos < 1_000 {
                ("ns", 1)
            } else if nanos < 1_000_000 {
                ("µs", 1_000)
            } else {
                ("ms", 1_000_000)
            };
            write_scaled(f, nanos, scale)?;
            return f.write_str(unit);
        }

        let hours = nanos / HOUR;
        nanos %= HOUR;
        let minutes = nanos / MINUTE;
        nanos %= MINUTE;

        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if hours > 0 || minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        write_scaled(f, nanos, SECOND)?;
        f.write_str("s")
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Nanos(i64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Nanos(nanos) => Ok(Duration(nanos)),
            Repr::Text(text) => Duration::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: i64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(Duration::parse("5s").unwrap(), secs(5));
        assert_eq!(Duration::parse("250ms").unwrap(), Duration::from_nanos(250_000_000));
        assert_eq!(Duration::parse("3us").unwrap(), Duration::from_nanos(3_000));
        assert_eq!(Duration::parse("3µs").unwrap(), Duration::from_nanos(3_000));
        assert_eq!(Duration::parse("7ns").unwrap(), Duration::from_nanos(7));
        assert_eq!(Duration::parse("2m").unwrap(), secs(120));
        assert_eq!(Duration::parse("1h").unwrap(), secs(3_600));
        assert_eq!(Duration::parse("1d").unwrap(), secs(86_400));
    }

    #[test]
    fn test_parse_compound_and_fractional() {
        assert_eq!(Duration::parse("1h30m").unwrap(), secs(5_400));
        assert_eq!(Duration::parse("1.5h").unwrap(), secs(5_400));
        assert_eq!(Duration::parse(".5s").unwrap(), Duration::from_nanos(500_000_000));
        assert_eq!(Duration::parse("1d2h").unwrap(), secs(93_600));
        assert_eq!(Duration::parse("-2m30s").unwrap(), secs(-150));
        assert_eq!(Duration::parse("+10s").unwrap(), secs(10));
    }

    #[test]
    fn test_parse_zero() {
        assert_eq!(Duration::parse("0").unwrap(), Duration::ZERO);
        assert_eq!(Duration::parse("-0").unwrap(), Duration::ZERO);
        assert_eq!(Duration::parse("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Duration::parse(""), Err(DurationError::Invalid("".into())));
        assert_eq!(Duration::parse("-"), Err(DurationError::Invalid("-".into())));
        assert_eq!(Duration::parse("5"), Err(DurationError::MissingUnit("5".into())));
        assert_eq!(Duration::parse("s"), Err(DurationError::Invalid("s".into())));
        assert_eq!(Duration::parse(".s"), Err(DurationError::Invalid(".s".into())));
        assert!(matches!(
            Duration::parse("5 seconds"),
            Err(DurationError::UnknownUnit { .. })
        ));
        assert!(matches!(
            Duration::parse("10y"),
            Err(DurationError::UnknownUnit { unit, .. }) if unit == "y"
        ));
        assert!(matches!(
            Duration::parse("9999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_extremes() {
        assert_eq!(
            Duration::parse("9223372036854775807ns").unwrap().as_nanos(),
            i64::MAX
        );
        assert_eq!(
            Duration::parse("-9223372036854775808ns").unwrap().as_nanos(),
            i64::MIN
        );
        assert!(Duration::parse("9223372036854775808ns").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Duration::ZERO.to_string(), "0s");
        assert_eq!(secs(5_400).to_string(), "1h30m0s");
        assert_eq!(Duration::from_nanos(1_500_000_000).to_string(), "1.5s");
        assert_eq!(Duration::from_nanos(250_000_000).to_string(), "250ms");
        assert_eq!(Duration::from_nanos(1_500).to_string(), "1.5µs");
        assert_eq!(secs(-90).to_string(), "-1m30s");
    }

    #[test]
    fn test_to_std() {
        assert_eq!(secs(3).to_std(), Some(std::time::Duration::from_secs(3)));
        assert_eq!(secs(-3).to_std(), None);
    }

    #[test]
    fn test_serde() {
        assert_eq!(serde_json::to_string(&secs(2)).unwrap(), "2000000000");
        let from_int: Duration = serde_json::from_str("1000").unwrap();
        assert_eq!(from_int, Duration::from_nanos(1_000));
        let from_text: Duration = serde_json::from_str("\"1m\"").unwrap();
        assert_eq!(from_text, secs(60));
        assert!(serde_json::from_str::<Duration>("\"soon\"").is_err());
    }
}
