use crate::datasource::TransferSource;
use crate::domain::holder::total_held;
use crate::domain::{Address, Amount, Holder, Snapshot, SnapshotSummary};
use crate::engine::{AggregationError, LedgerAggregator};
use crate::error::AppError;
use crate::id::generate_id;
use crate::store::SnapshotRegistry;
use std::sync::Arc;
use tracing::info;

/// Captures holder tables from a transfer source and serves them by id.
#[derive(Clone)]
pub struct SnapshotService {
    source: Arc<dyn TransferSource>,
    registry: Arc<SnapshotRegistry>,
    chain_id: u64,
}

impl SnapshotService {
    pub fn new(
        source: Arc<dyn TransferSource>,
        registry: Arc<SnapshotRegistry>,
        chain_id: u64,
    ) -> Self {
        Self {
            source,
            registry,
            chain_id,
        }
    }

    /// Aggregate the full transfer history up to the source's latest block
    /// and publish the result.
    pub async fn take_snapshot(&self) -> Result<Arc<Snapshot>, AppError> {
        let head = self.source.latest_block().await?;
        let transfers = self.source.fetch_transfers(0, head.number).await?;
        let total_supply = self.source.total_supply(head.number).await?;

        let holders = LedgerAggregator::aggregate(&transfers, total_supply)?;
        let total_supply_held = total_held(&holders).ok_or(AggregationError::SupplyExceeded {
            held: Amount::MAX,
            total_supply,
        })?;

        let snapshot = Snapshot {
            summary: SnapshotSummary {
                id: generate_id("snap"),
                block_number: head.number,
                timestamp: head.timestamp,
                total_holders: holders.len(),
                total_supply_held,
                chain_id: self.chain_id,
            },
            holders,
        };

        let id = snapshot.id().to_string();
        let published = self
            .registry
            .insert(id, snapshot)
            .map_err(|occupied| AppError::Internal(occupied.to_string()))?;
        info!(
            snapshot_id = %published.id(),
            block = published.summary.block_number,
            transfers = transfers.len(),
            holders = published.summary.total_holders,
            "published snapshot"
        );
        Ok(published)
    }

    pub fn get_snapshot(&self, id: &str) -> Result<Arc<Snapshot>, AppError> {
        self.registry
            .get(id)
            .ok_or_else(|| AppError::SnapshotNotFound(id.to_string()))
    }

    pub fn get_holders(&self, id: &str) -> Result<Vec<Holder>, AppError> {
        Ok(self.get_snapshot(id)?.holders.clone())
    }

    /// Whether `address` held exactly `expected_balance` in snapshot `id`.
    /// An address absent from the snapshot only matches a zero balance.
    pub fn verify_holder(
        &self,
        id: &str,
        address: &Address,
        expected_balance: Amount,
    ) -> Result<bool, AppError> {
        let snapshot = self.get_snapshot(id)?;
        let balance = snapshot
            .find_holder(address)
            .map_or(Amount::ZERO, |h| h.balance);
        Ok(balance == expected_balance)
    }

    /// Drop a snapshot from the registry. Returns whether it was present.
    pub fn evict(&self, id: &str) -> bool {
        self.registry.remove(id).is_some()
    }
}
