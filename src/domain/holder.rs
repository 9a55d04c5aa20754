//! Token holder balances at a snapshot block.

use super::primitives::{Address, Amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A holder with a strictly positive balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub address: Address,
    #[serde(with = "crate::domain::amount")]
    pub balance: Amount,
    /// Share of total supply in percent, truncated to hundredths
    /// (`12.34` means 12.34%).
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_of_supply: Decimal,
}

impl Holder {
    pub fn new(address: Address, balance: Amount, basis_points: u64) -> Self {
        Self {
            address,
            balance,
            percent_of_supply: basis_points_to_percent(basis_points),
        }
    }
}

/// 1234 bps -> 12.34
pub fn basis_points_to_percent(basis_points: u64) -> Decimal {
    Decimal::new(basis_points as i64, 2)
}

/// Sum of all holder balances, `None` on overflow.
pub fn total_held(holders: &[Holder]) -> Option<Amount> {
    holders
        .iter()
        .try_fold(Amount::ZERO, |acc, h| acc.checked_add(h.balance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_basis_points_to_percent() {
        assert_eq!(basis_points_to_percent(1234).to_string(), "12.34");
        assert_eq!(basis_points_to_percent(10_000).to_string(), "100.00");
        assert_eq!(basis_points_to_percent(0).to_string(), "0.00");
    }

    #[test]
    fn test_holder_json_shape() {
        let holder = Holder::new(
            Address::from_str("0x1111111111111111111111111111111111111111").unwrap(),
            Amount::from(60u64),
            6000,
        );
        let json = serde_json::to_value(&holder).unwrap();
        assert_eq!(json["address"], "0x1111111111111111111111111111111111111111");
        assert_eq!(json["balance"], "60");
        assert_eq!(json["percentOfSupply"], 60.0);
    }

    #[test]
    fn test_total_held() {
        let a = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let holders = vec![
            Holder::new(a, Amount::from(60u64), 0),
            Holder::new(a, Amount::from(40u64), 0),
        ];
        assert_eq!(total_held(&holders), Some(Amount::from(100u64)));
        assert_eq!(total_held(&[]), Some(Amount::ZERO));

        let overflow = vec![
            Holder::new(a, Amount::MAX, 0),
            Holder::new(a, Amount::from(1u64), 0),
        ];
        assert_eq!(total_held(&overflow), None);
    }
}
