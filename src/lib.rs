pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod id;
pub mod orchestration;
pub mod store;

pub use config::Config;
pub use datasource::{CsvTransferSource, MockTransferSource, SourceError, TransferSource};
pub use domain::{
    Address, Amount, BlockNumber, Hash256, Holder, MerkleLeaf, MerkleProof, Snapshot,
    SqrtPriceResult, TransferEvent, TreeMetadata,
};
pub use engine::{LedgerAggregator, MerkleEngine, PriceEngine};
pub use error::{AppError, ErrorKind};
pub use orchestration::{
    DistributionPipeline, DistributionPlan, DistributionRequest, SnapshotService,
};
pub use store::{ArchiveStore, FsArchive, MemoryArchive, SnapshotRegistry, TreeRegistry};
