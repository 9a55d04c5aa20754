use super::snapshot::SnapshotService;
use crate::config::Config;
use crate::domain::{Amount, SnapshotSummary, SqrtPriceResult, TreeMetadata};
use crate::engine::merkle::holder_leaves;
use crate::engine::{AirstreamAllocation, MerkleEngine, PriceEngine};
use crate::error::AppError;
use crate::store::{ArchiveError, ArchiveStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Parameters for one distribution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionRequest {
    pub spirit_fdv: Amount,
    pub child_fdv: Amount,
    /// Scale leaves to pro-rata shares of this amount. Raw balances are
    /// used when unset.
    pub total_airdrop: Option<Amount>,
}

impl From<&Config> for DistributionRequest {
    fn from(config: &Config) -> Self {
        Self {
            spirit_fdv: config.spirit_fdv,
            child_fdv: config.child_fdv,
            total_airdrop: config.total_airdrop,
        }
    }
}

/// Everything needed to deploy a distribution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPlan {
    pub snapshot: SnapshotSummary,
    pub tree: TreeMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airstream: Option<AirstreamAllocation>,
    pub price: SqrtPriceResult,
    pub price_within_bounds: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_archive_key: Option<String>,
}

/// Snapshot, tree and price in one pass.
#[derive(Clone)]
pub struct DistributionPipeline {
    snapshots: SnapshotService,
    merkle: MerkleEngine,
    archive: Option<Arc<dyn ArchiveStore>>,
}

impl DistributionPipeline {
    pub fn new(
        snapshots: SnapshotService,
        merkle: MerkleEngine,
        archive: Option<Arc<dyn ArchiveStore>>,
    ) -> Self {
        Self {
            snapshots,
            merkle,
            archive,
        }
    }

    pub fn snapshots(&self) -> &SnapshotService {
        &self.snapshots
    }

    pub fn merkle(&self) -> &MerkleEngine {
        &self.merkle
    }

    /// The tree is published last; on any earlier error only the snapshot
    /// remains registered. Archive failures are logged, not returned.
    pub async fn create_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<DistributionPlan, AppError> {
        let snapshot = self.snapshots.take_snapshot().await?;

        let airstream = request
            .total_airdrop
            .map(|total| MerkleEngine::calculate_airstream_amounts(&snapshot.holders, total))
            .transpose()?;
        if let Some(allocation) = &airstream {
            info!(
                snapshot_id = %snapshot.id(),
                recipients = allocation.len(),
                distributed = %allocation.distributed,
                remainder = %allocation.remainder,
                "calculated airstream allocation"
            );
        }
        let leaves = match &airstream {
            Some(allocation) => allocation.leaves(),
            None => holder_leaves(&snapshot.holders),
        };

        let price = PriceEngine::calculate_sqrt_price(request.spirit_fdv, request.child_fdv)?;
        let price_within_bounds = PriceEngine::validate_sqrt_price(price.sqrt_price_x96);

        let mut stored = self.merkle.prepare_tree(snapshot.id(), leaves)?;
        let mut snapshot_archive_key = None;
        if let Some(archive) = &self.archive {
            match archive.put_snapshot(&snapshot).await {
                Ok(key) => snapshot_archive_key = Some(key),
                Err(e) => {
                    warn!(snapshot_id = %snapshot.id(), error = %e, "failed to archive snapshot")
                }
            }

            let export = stored.export().to_json()?;
            match archive.put_tree(&stored.metadata.id, &export).await {
                Ok(key) => stored = stored.with_archive_key(key),
                Err(e) => {
                    warn!(tree_id = %stored.metadata.id, error = %e, "failed to archive tree")
                }
            }
        }
        let tree = self.merkle.publish(stored)?;

        info!(
            snapshot_id = %snapshot.id(),
            tree_id = %tree.id,
            sqrt_price_x96 = %price.sqrt_price_x96,
            price_within_bounds,
            "created distribution"
        );

        Ok(DistributionPlan {
            snapshot: snapshot.summary.clone(),
            tree,
            airstream,
            price,
            price_within_bounds,
            snapshot_archive_key,
        })
    }

    /// Re-import an archived tree under `metadata.id`.
    pub async fn restore_tree(
        &self,
        archive_key: &str,
        metadata: TreeMetadata,
    ) -> Result<TreeMetadata, AppError> {
        let archive = self.archive.as_ref().ok_or(ArchiveError::Unconfigured)?;
        let json = archive.get_tree(archive_key).await?;
        let metadata = TreeMetadata {
            archive_key: Some(archive_key.to_string()),
            ..metadata
        };
        Ok(self.merkle.import_tree(&json, metadata)?)
    }
}
