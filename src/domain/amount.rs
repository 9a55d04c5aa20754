//! Lossless text encoding for 256-bit amounts.
//!
//! Amounts travel as base-10 strings (JSON numbers cannot carry uint256
//! without precision loss). Use with `#[serde(with = "crate::domain::amount")]`.

use super::primitives::Amount;
use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is not a base-10 uint256: {0}")]
    Invalid(String),
}

/// Parse a base-10 unsigned integer into an [`Amount`].
///
/// Signs, decimal points, exponents and hex prefixes are all rejected.
pub fn parse_amount(s: &str) -> Result<Amount, AmountParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(AmountParseError::Empty);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountParseError::Invalid(s.to_string()));
    }
    Amount::from_str_radix(trimmed, 10).map_err(|_| AmountParseError::Invalid(s.to_string()))
}

pub fn serialize<S: Serializer>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_amount(&s).map_err(serde::de::Error::custom)
}

/// Lossy conversion used only for informational ratios.
pub fn amount_to_f64(value: Amount) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 18_446_744_073_709_551_616.0 + limb as f64)
}
