//! Domain primitives: Address, BlockNumber, Amount, UnixSeconds.

use alloy_primitives::{Address as RawAddress, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unsigned 256-bit token amount.
pub type Amount = U256;

/// Block height on the source chain.
pub type BlockNumber = u64;

/// Seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixSeconds(pub i64);

impl UnixSeconds {
    pub fn new(secs: i64) -> Self {
        UnixSeconds(secs)
    }

    pub fn now() -> Self {
        UnixSeconds(chrono::Utc::now().timestamp())
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must have 40 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("address contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// 20-byte account address.
///
/// Parsing is case-insensitive; the canonical text form is lowercase,
/// `0x`-prefixed. Ordering is byte-wise, which matches ordering of the
/// lowercase hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(RawAddress);

impl Address {
    /// The mint/burn address.
    pub const ZERO: Address = Address(RawAddress::ZERO);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(RawAddress::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == RawAddress::ZERO
    }

    /// Canonical lowercase form.
    pub fn to_canonical_string(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
        if digits.len() != 40 {
            return Err(AddressParseError::InvalidLength(digits.len()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| AddressParseError::InvalidHex(s.to_string()))?;
        Ok(Address::from_bytes(bytes))
    }
}

impl From<RawAddress> for Address {
    fn from(value: RawAddress) -> Self {
        Address(value)
    }
}

impl From<Address> for RawAddress {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}
