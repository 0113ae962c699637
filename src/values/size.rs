//! Human-readable byte sizes.
//!
//! SI suffixes (`kb`, `mb`, ...) are powers of 1000 and IEC suffixes
//! (`kib`, `mib`, ...) powers of 1024, so `"1MB"` is 1_000_000 bytes and
//! `"1MiB"` is 1_048_576. Suffixes are case-insensitive and may be
//! separated from the number by whitespace.

use thiserror::Error;

/// Errors produced while parsing a byte size.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("invalid size '{0}'")]
    Invalid(String),

    #[error("unhandled size name: {0}")]
    UnknownUnit(String),

    #[error("size '{0}' is too large")]
    TooLarge(String),
}

const KB: u64 = 1_000;
const KIB: u64 = 1_024;

fn unit_multiplier(unit: &str) -> Option<u64> {
    let multiplier = match unit {
        "" | "b" => 1,
        "k" | "kb" => KB,
        "ki" | "kib" => KIB,
        "m" | "mb" => KB.pow(2),
        "mi" | "mib" => KIB.pow(2),
        "g" | "gb" => KB.pow(3),
        "gi" | "gib" => KIB.pow(3),
        "t" | "tb" => KB.pow(4),
        "ti" | "tib" => KIB.pow(4),
        "p" | "pb" => KB.pow(5),
        "pi" | "pib" => KIB.pow(5),
        "e" | "eb" => KB.pow(6),
        "ei" | "eib" => KIB.pow(6),
        _ => return None,
    };
    Some(multiplier)
}

/// Parse a size such as `"4096"`, `"1.5 KB"` or `"16MiB"` into bytes.
pub fn parse_bytes(input: &str) -> Result<u64, SizeError> {
    let number_len = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(input.len());
    let (number, unit) = input.split_at(number_len);

    // Thousands separators are accepted and ignored.
    let number: String = number.chars().filter(|&c| c != ',').collect();
    let value: f64 = number
        .parse()
        .map_err(|_| SizeError::Invalid(input.to_string()))?;

    let unit = unit.trim().to_ascii_lowercase();
    let multiplier = unit_multiplier(&unit).ok_or(SizeError::UnknownUnit(unit))?;

    let bytes = value * multiplier as f64;
    if bytes >= u64::MAX as f64 {
        return Err(SizeError::TooLarge(input.to_string()));
    }
    Ok(bytes as u64)
}
