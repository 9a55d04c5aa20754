//! Token transfer events and their canonical ordering.

use super::amount::{parse_amount, AmountParseError};
use super::primitives::{Address, AddressParseError, Amount, BlockNumber};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A single ERC-20 `Transfer(from, to, value)` log entry.
///
/// Mints have `from == Address::ZERO`, burns have `to == Address::ZERO`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    #[serde(with = "crate::domain::amount")]
    pub value: Amount,
    pub block_number: BlockNumber,
    /// Position of the log within its block.
    #[serde(default)]
    pub log_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid `{field}` address: {source}")]
    Address {
        field: &'static str,
        source: AddressParseError,
    },
    #[error("invalid value: {0}")]
    Value(#[from] AmountParseError),
}

impl TransferEvent {
    pub fn new(
        from: Address,
        to: Address,
        value: Amount,
        block_number: BlockNumber,
        log_index: u64,
    ) -> Self {
        Self {
            from,
            to,
            value,
            block_number,
            log_index,
        }
    }

    /// Build an event from raw text columns, failing on the first missing
    /// or malformed field.
    pub fn parse(
        from: Option<&str>,
        to: Option<&str>,
        value: Option<&str>,
        block_number: BlockNumber,
        log_index: u64,
    ) -> Result<Self, TransferParseError> {
        let from = parse_field("from", from)?;
        let to = parse_field("to", to)?;
        let value = value
            .filter(|v| !v.trim().is_empty())
            .ok_or(TransferParseError::MissingField("value"))?;
        let value = parse_amount(value)?;
        Ok(Self::new(from, to, value, block_number, log_index))
    }

    pub fn is_mint(&self) -> bool {
        self.from.is_zero()
    }

    pub fn is_burn(&self) -> bool {
        self.to.is_zero()
    }

    pub fn ordering_key(&self) -> TransferOrderingKey {
        TransferOrderingKey {
            block_number: self.block_number,
            log_index: self.log_index,
        }
    }
}

fn parse_field(field: &'static str, raw: Option<&str>) -> Result<Address, TransferParseError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or(TransferParseError::MissingField(field))?;
    Address::from_str(raw).map_err(|source| TransferParseError::Address { field, source })
}

/// Log position: block number, then log index within the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransferOrderingKey {
    pub block_number: BlockNumber,
    pub log_index: u64,
}

/// Sort events into chain order. The sort is stable, so events sharing a
/// position keep their relative input order.
pub fn sort_transfers(events: &mut [TransferEvent]) {
    events.sort_by_key(TransferEvent::ordering_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn test_parse_valid_event() {
        let ev = TransferEvent::parse(Some(A), Some(B), Some("100"), 7, 2).unwrap();
        assert_eq!(ev.from.to_string(), A);
        assert_eq!(ev.to.to_string(), B);
        assert_eq!(ev.value, Amount::from(100u64));
        assert_eq!(ev.block_number, 7);
        assert_eq!(ev.log_index, 2);
        assert!(!ev.is_mint());
        assert!(!ev.is_burn());
    }

    #[test]
    fn test_parse_missing_fields() {
        assert_eq!(
            TransferEvent::parse(None, Some(B), Some("1"), 1, 0),
            Err(TransferParseError::MissingField("from"))
        );
        assert_eq!(
            TransferEvent::parse(Some(A), Some(" "), Some("1"), 1, 0),
            Err(TransferParseError::MissingField("to"))
        );
        assert_eq!(
            TransferEvent::parse(Some(A), Some(B), None, 1, 0),
            Err(TransferParseError::MissingField("value"))
        );
    }

    #[test]
    fn test_parse_malformed_fields() {
        assert!(matches!(
            TransferEvent::parse(Some("0x12"), Some(B), Some("1"), 1, 0),
            Err(TransferParseError::Address { field: "from", .. })
        ));
        assert!(matches!(
            TransferEvent::parse(Some(A), Some(B), Some("-5"), 1, 0),
            Err(TransferParseError::Value(_))
        ));
    }

    #[test]
    fn test_sort_transfers_by_block_then_log_index() {
        let a = Address::from_str(A).unwrap();
        let b = Address::from_str(B).unwrap();
        let mut events = vec![
            TransferEvent::new(a, b, Amount::from(3u64), 2, 0),
            TransferEvent::new(a, b, Amount::from(2u64), 1, 5),
            TransferEvent::new(a, b, Amount::from(1u64), 1, 1),
        ];
        sort_transfers(&mut events);
        let values: Vec<u64> = events
            .iter()
            .map(|e| u64::try_from(e.value).unwrap())
            .collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_mint_and_burn_flags() {
        let a = Address::from_str(A).unwrap();
        let mint = TransferEvent::new(Address::ZERO, a, Amount::from(1u64), 1, 0);
        let burn = TransferEvent::new(a, Address::ZERO, Amount::from(1u64), 1, 1);
        assert!(mint.is_mint());
        assert!(burn.is_burn());
    }

    #[test]
    fn test_event_json_shape() {
        let a = Address::from_str(A).unwrap();
        let ev = TransferEvent::new(Address::ZERO, a, Amount::from(100u64), 9, 1);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["value"], "100");
        assert_eq!(json["blockNumber"], 9);
        assert_eq!(json["logIndex"], 1);
    }
}
