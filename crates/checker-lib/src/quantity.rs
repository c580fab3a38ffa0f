//! Kubernetes resource quantities
//!
//! Parses the textual quantity notation used in pod specs and the metrics
//! API (`100m`, `0.5`, `128Mi`, `1e3`, `250000000n`) into an exact integer
//! amount of milli-units. CPU is read back in milli-cores, memory in bytes.
//! Anything up to `i64::MAX` whole units is accepted, like the API server.

use crate::error::QuantityError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Bytes in one mebibyte
pub const MIB: u64 = 1024 * 1024;

/// Largest accepted value, in milli-units
const MAX_MILLIS: u128 = i64::MAX as u128 * 1000;

/// A parsed resource quantity
///
/// Keeps the original text for display. Values that are not a whole number
/// of milli-units are rounded up, the same way the API server does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity {
    raw: String,
    millis: u128,
}

impl Quantity {
    /// Parse a quantity string
    pub fn parse(text: &str) -> Result<Self, QuantityError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(QuantityError::Negative(trimmed.to_string()));
        }
        let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

        let split = unsigned
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let (mantissa, fraction_digits) = parse_decimal(number)
            .ok_or_else(|| QuantityError::InvalidNumber(trimmed.to_string()))?;
        let (binary_multiplier, decimal_exponent) = parse_suffix(trimmed, suffix)?;

        let overflow = || QuantityError::Overflow(trimmed.to_string());

        // Scale to milli-units: value * 2^k * 10^(exp + 3 - fraction_digits)
        let scaled = mantissa.checked_mul(binary_multiplier).ok_or_else(overflow)?;
        let exponent = decimal_exponent + 3 - fraction_digits as i32;
        let millis = if exponent >= 0 {
            let factor = 10u128
                .checked_pow(exponent as u32)
                .ok_or_else(overflow)?;
            scaled.checked_mul(factor).ok_or_else(overflow)?
        } else {
            match 10u128.checked_pow(exponent.unsigned_abs()) {
                Some(divisor) => scaled.div_ceil(divisor),
                // Anything non-zero this small still rounds up to one milli-unit
                None => u128::from(scaled > 0),
            }
        };

        if millis > MAX_MILLIS {
            return Err(overflow());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            millis,
        })
    }

    /// Build a CPU quantity from milli-cores
    pub fn from_millicores(millicores: u64) -> Self {
        Self {
            raw: format!("{}m", millicores),
            millis: u128::from(millicores),
        }
    }

    /// Build a memory quantity from mebibytes
    pub fn from_mebibytes(mebibytes: u64) -> Self {
        Self {
            raw: format!("{}Mi", mebibytes),
            millis: u128::from(mebibytes) * u128::from(MIB) * 1000,
        }
    }

    /// Value in milli-units (milli-cores for CPU), saturating at `u64::MAX`
    pub fn millis(&self) -> u64 {
        u64::try_from(self.millis).unwrap_or(u64::MAX)
    }

    /// Value in whole units, rounded up (bytes for memory)
    pub fn value(&self) -> u64 {
        // At most i64::MAX after parsing
        u64::try_from(self.millis.div_ceil(1000)).unwrap_or(u64::MAX)
    }

    /// The quantity as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }
}

/// Split `12.50` into mantissa 1250 with 2 fraction digits
fn parse_decimal(number: &str) -> Option<(u128, usize)> {
    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.contains('.') {
        return None;
    }

    let mut mantissa: u128 = 0;
    for c in whole.chars().chain(fraction.chars()) {
        let digit = c.to_digit(10)?;
        mantissa = mantissa.checked_mul(10)?.checked_add(u128::from(digit))?;
    }
    Some((mantissa, fraction.len()))
}

/// Map a suffix to (binary multiplier, decimal exponent)
fn parse_suffix(quantity: &str, suffix: &str) -> Result<(u128, i32), QuantityError> {
    let parsed = match suffix {
        "" => (1, 0),
        "n" => (1, -9),
        "u" => (1, -6),
        "m" => (1, -3),
        "k" => (1, 3),
        "M" => (1, 6),
        "G" => (1, 9),
        "T" => (1, 12),
        "P" => (1, 15),
        "E" => (1, 18),
        "Ki" => (1 << 10, 0),
        "Mi" => (1 << 20, 0),
        "Gi" => (1 << 30, 0),
        "Ti" => (1 << 40, 0),
        "Pi" => (1 << 50, 0),
        "Ei" => (1 << 60, 0),
        other => {
            let exponent = other
                .strip_prefix('e')
                .or_else(|| other.strip_prefix('E'))
                .and_then(|e| e.parse::<i32>().ok())
                .filter(|e| e.abs() <= 64);
            match exponent {
                Some(e) => (1, e),
                None => {
                    return Err(QuantityError::UnknownSuffix {
                        quantity: quantity.to_string(),
                        suffix: other.to_string(),
                    })
                }
            }
        }
    };
    Ok(parsed)
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
