//! Pure computation engines for deterministic distribution logic.
//!
//! This module provides:
//! - `LedgerAggregator`: transfer log replay into a holder table
//! - `MerkleEngine`: distribution trees, proofs and export/import
//! - Pro-rata airstream allocation
//! - `PriceEngine`: Q64.96 initial pool price

pub mod airstream;
pub mod ledger;
pub mod merkle;
pub mod price;

pub use airstream::{calculate_airstream_amounts, AirstreamAllocation, AirstreamError};
pub use ledger::{AggregationError, LedgerAggregator};
pub use merkle::{MerkleEngine, MerkleError, MerkleTree, StoredTree, TreeExport};
pub use price::{isqrt, PriceEngine, PriceError, Q96, SCALE};
