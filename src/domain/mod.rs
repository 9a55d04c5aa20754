//! Domain types for token distribution snapshots.
//!
//! This module provides:
//! - Address and 256-bit amount primitives with canonical text forms
//! - Transfer events and their chain ordering
//! - Holder, Snapshot, Merkle and price value types with camelCase JSON

pub mod amount;
pub mod holder;
pub mod merkle;
pub mod price;
pub mod primitives;
pub mod snapshot;
pub mod transfer;

pub use amount::{parse_amount, AmountParseError};
pub use holder::Holder;
pub use merkle::{format_hash, parse_hash, Hash256, MerkleLeaf, MerkleProof, TreeMetadata};
pub use price::SqrtPriceResult;
pub use primitives::{Address, AddressParseError, Amount, BlockNumber, UnixSeconds};
pub use snapshot::{Snapshot, SnapshotSummary};
pub use transfer::{sort_transfers, TransferEvent, TransferOrderingKey, TransferParseError};
