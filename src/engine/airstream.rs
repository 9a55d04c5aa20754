//! Pro-rata airdrop ("airstream") allocation.

use crate::domain::holder::total_held;
use crate::domain::{Address, Amount, Holder, MerkleLeaf};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AirstreamError {
    #[error("sum of holder balances overflows uint256")]
    HeldOverflow,
    #[error("allocation for {0} overflows uint256")]
    AllocationOverflow(Address),
}

/// Per-holder shares of an airdrop.
///
/// Each amount is `floor(balance * total_airdrop / total_held)`, so
/// `distributed + remainder == total_airdrop` and the remainder is strictly
/// less than the number of holders. What happens to the remainder is the
/// caller's policy; it is reported here and never folded back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirstreamAllocation {
    /// Non-zero allocations in holder order. Serialized as a list of leaves.
    #[serde(serialize_with = "serialize_as_leaves")]
    pub allocations: IndexMap<Address, Amount>,
    #[serde(with = "crate::domain::amount")]
    pub total_airdrop: Amount,
    #[serde(with = "crate::domain::amount")]
    pub total_held: Amount,
    #[serde(with = "crate::domain::amount")]
    pub distributed: Amount,
    #[serde(with = "crate::domain::amount")]
    pub remainder: Amount,
}

impl AirstreamAllocation {
    pub fn get(&self, address: &Address) -> Option<Amount> {
        self.allocations.get(address).copied()
    }

    /// Allocations as merkle leaves, in holder order.
    pub fn leaves(&self) -> Vec<MerkleLeaf> {
        self.allocations
            .iter()
            .map(|(address, amount)| MerkleLeaf::new(*address, *amount))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

fn serialize_as_leaves<S: Serializer>(
    allocations: &IndexMap<Address, Amount>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        allocations
            .iter()
            .map(|(address, amount)| MerkleLeaf::new(*address, *amount)),
    )
}

pub fn calculate_airstream_amounts(
    holders: &[Holder],
    total_airdrop: Amount,
) -> Result<AirstreamAllocation, AirstreamError> {
    let total_held = total_held(holders).ok_or(AirstreamError::HeldOverflow)?;

    let mut allocations = IndexMap::with_capacity(holders.len());
    let mut distributed = Amount::ZERO;
    if !total_held.is_zero() {
        for holder in holders {
            let amount = holder
                .balance
                .checked_mul(total_airdrop)
                .ok_or(AirstreamError::AllocationOverflow(holder.address))?
                / total_held;
            if amount.is_zero() {
                continue;
            }
            distributed += amount;
            allocations.insert(holder.address, amount);
        }
    }

    Ok(AirstreamAllocation {
        allocations,
        total_airdrop,
        total_held,
        distributed,
        remainder: total_airdrop - distributed,
    })
}
