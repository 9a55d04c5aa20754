//! Transfer log sources.

use crate::domain::{Amount, BlockNumber, TransferEvent, TransferParseError, UnixSeconds};
use crate::error::ErrorKind;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod csv_log;
pub mod mock;

pub use csv_log::CsvTransferSource;
pub use mock::MockTransferSource;

/// Head of the source chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub timestamp: UnixSeconds,
}

/// Source of ERC-20 transfer history and supply.
#[async_trait]
pub trait TransferSource: Send + Sync + fmt::Debug {
    /// Latest block the source can answer for.
    async fn latest_block(&self) -> Result<BlockHeader, SourceError>;

    /// Transfers in blocks `from_block..=to_block`, ordered by
    /// (block_number, log_index).
    async fn fetch_transfers(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<Vec<TransferEvent>, SourceError>;

    /// Total token supply as of `at_block`.
    async fn total_supply(&self, at_block: BlockNumber) -> Result<Amount, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lz4 decode error: {0}")]
    Lz4(String),
    #[error("csv parse error: {0}")]
    Csv(String),
    #[error("invalid transfer at row {row}: {source}")]
    InvalidRow {
        row: usize,
        source: TransferParseError,
    },
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Io(_) | SourceError::Unavailable(_) => ErrorKind::Unavailable,
            SourceError::Lz4(_) | SourceError::Csv(_) | SourceError::InvalidRow { .. } => {
                ErrorKind::InvalidInput
            }
        }
    }
}
