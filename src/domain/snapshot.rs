//! Point-in-time holder tables.

use super::holder::Holder;
use super::primitives::{Address, Amount, BlockNumber, UnixSeconds};
use serde::{Deserialize, Serialize};

/// Snapshot header, without the holder table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub id: String,
    pub block_number: BlockNumber,
    pub timestamp: UnixSeconds,
    pub total_holders: usize,
    #[serde(with = "crate::domain::amount")]
    pub total_supply_held: Amount,
    pub chain_id: u64,
}

/// An immutable holder table captured at `block_number`.
///
/// Holders are ordered by balance descending, then address ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(flatten)]
    pub summary: SnapshotSummary,
    pub holders: Vec<Holder>,
}

impl Snapshot {
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn holders(&self) -> &[Holder] {
        &self.holders
    }

    pub fn find_holder(&self, address: &Address) -> Option<&Holder> {
        self.holders.iter().find(|h| &h.address == address)
    }
}
