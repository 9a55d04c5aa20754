use crate::config::ConfigError;
use crate::datasource::SourceError;
use crate::engine::{AggregationError, AirstreamError, MerkleError, PriceError};
use crate::store::ArchiveError;
use thiserror::Error;

/// Coarse classification shared by every component error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    ArithmeticInconsistency,
    Unavailable,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
    #[error("Merkle error: {0}")]
    Merkle(#[from] MerkleError),
    #[error("Airstream error: {0}")]
    Airstream(#[from] AirstreamError),
    #[error("Price error: {0}")]
    Price(#[from] PriceError),
    #[error("Transfer source error: {0}")]
    Source(#[from] SourceError),
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::InvalidInput,
            AppError::SnapshotNotFound(_) => ErrorKind::NotFound,
            AppError::Aggregation(e) => e.kind(),
            AppError::Merkle(e) => e.kind(),
            AppError::Airstream(_) => ErrorKind::InvalidInput,
            AppError::Price(e) => e.kind(),
            AppError::Source(e) => e.kind(),
            AppError::Archive(e) => e.kind(),
            AppError::Internal(_) => ErrorKind::Unavailable,
        }
    }
}
