//! Atomic token amount parsing and formatting.
//!
//! Amounts are carried as `u128` atomic units (no decimals) and transported
//! over the wire as decimal strings. Never floating point.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serializer};
use std::fmt;
use thiserror::Error;

/// Decimals of the SENT token: one token is `10^9` atomic units.
pub const SENT_DECIMALS: u32 = 9;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount: {0}")]
    Invalid(String),
    #[error("amount overflow: {0}")]
    Overflow(String),
}

/// Convert a human decimal string to an atomic amount with `decimals`
/// fractional digits. The fractional part is right-padded with zeros to
/// exactly `decimals` digits, or truncated when longer. A string without the
/// separator is an integer token amount scaled by `10^decimals`.
pub fn string_to_atomic(s: &str, decimals: u32, separator: char) -> Result<u128, AmountError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let mut parts = trimmed.split(separator);
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    let int: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?
    };
    let mut frac_digits: String = frac_part.chars().take(decimals as usize).collect();
    while frac_digits.len() < decimals as usize {
        frac_digits.push('0');
    }
    let frac: u128 = if frac_digits.is_empty() {
        0
    } else {
        frac_digits
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?
    };
    let scale = 10u128
        .checked_pow(decimals)
        .ok_or_else(|| AmountError::Overflow(s.to_string()))?;
    int.checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(|| AmountError::Overflow(s.to_string()))
}

/// Render an atomic amount as a decimal string. Trailing zeros are trimmed
/// from the fractional part, and the fractional part is omitted entirely when
/// it is exactly zero.
pub fn atomic_to_string(value: u128, decimals: u32, separator: char) -> String {
    let scale = 10u128.pow(decimals);
    let int = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return int.to_string();
    }
    let mut frac_str = format!("{frac:0width$}", width = decimals as usize);
    while frac_str.ends_with('0') {
        frac_str.pop();
    }
    format!("{int}{separator}{frac_str}")
}

/// Format an atomic SENT amount for display, keeping at most `max_decimals`
/// fractional digits.
pub fn format_sent(value: u128, max_decimals: u32) -> String {
    let kept = max_decimals.min(SENT_DECIMALS);
    let step = 10u128.pow(SENT_DECIMALS - kept);
    let truncated = value / step * step;
    format!("{} SENT", atomic_to_string(truncated, SENT_DECIMALS, '.'))
}

struct AtomicVisitor;

impl Visitor<'_> for AtomicVisitor {
    type Value = u128;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an atomic amount as a decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.trim()
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(u128::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }
}

/// Serde adapter for atomic amounts transported as decimal strings. Accepts
/// bare integers too, since some backends emit small amounts as JSON numbers.
pub mod serde_atomic {
    use super::{AtomicVisitor, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(AtomicVisitor)
    }
}

/// [`serde_atomic`] for optional amounts.
pub mod serde_atomic_opt {
    use super::{serde_atomic, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Wrapper(#[serde(with = "serde_atomic")] u128);

    pub fn serialize<S: Serializer>(
        value: &Option<u128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u128>, D::Error> {
        Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}
