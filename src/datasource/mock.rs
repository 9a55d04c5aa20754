//! In-memory transfer source for tests.

use super::{BlockHeader, SourceError, TransferSource};
use crate::domain::{sort_transfers, Amount, BlockNumber, TransferEvent, UnixSeconds};
use async_trait::async_trait;

/// Transfer source that serves predefined events.
#[derive(Debug, Clone, Default)]
pub struct MockTransferSource {
    transfers: Vec<TransferEvent>,
    total_supply: Amount,
    latest: Option<BlockHeader>,
    unavailable: Option<String>,
}

impl MockTransferSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transfer(mut self, transfer: TransferEvent) -> Self {
        self.transfers.push(transfer);
        self
    }

    pub fn with_transfers(mut self, transfers: Vec<TransferEvent>) -> Self {
        self.transfers.extend(transfers);
        self
    }

    pub fn with_total_supply(mut self, total_supply: Amount) -> Self {
        self.total_supply = total_supply;
        self
    }

    /// Pin the reported head. Defaults to the highest transfer block at
    /// timestamp zero.
    pub fn with_latest_block(mut self, number: BlockNumber, timestamp: UnixSeconds) -> Self {
        self.latest = Some(BlockHeader { number, timestamp });
        self
    }

    /// Make every call fail with `Unavailable`.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.unavailable = Some(reason.into());
        self
    }

    fn check_available(&self) -> Result<(), SourceError> {
        match &self.unavailable {
            Some(reason) => Err(SourceError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TransferSource for MockTransferSource {
    async fn latest_block(&self) -> Result<BlockHeader, SourceError> {
        self.check_available()?;
        Ok(self.latest.unwrap_or_else(|| BlockHeader {
            number: self
                .transfers
                .iter()
                .map(|t| t.block_number)
                .max()
                .unwrap_or(0),
            timestamp: UnixSeconds::new(0),
        }))
    }

    async fn fetch_transfers(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<Vec<TransferEvent>, SourceError> {
        self.check_available()?;
        let mut transfers: Vec<TransferEvent> = self
            .transfers
            .iter()
            .filter(|t| t.block_number >= from_block && t.block_number <= to_block)
            .cloned()
            .collect();
        sort_transfers(&mut transfers);
        Ok(transfers)
    }

    async fn total_supply(&self, _at_block: BlockNumber) -> Result<Amount, SourceError> {
        self.check_available()?;
        Ok(self.total_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;

    fn transfer(block: u64, log_index: u64) -> TransferEvent {
        TransferEvent::new(
            Address::ZERO,
            Address::from_bytes([1; 20]),
            Amount::from(1u64),
            block,
            log_index,
        )
    }

    #[tokio::test]
    async fn test_fetch_transfers_filters_and_orders() {
        let mock = MockTransferSource::new().with_transfers(vec![
            transfer(5, 0),
            transfer(2, 1),
            transfer(2, 0),
            transfer(9, 0),
        ]);
        let transfers = mock.fetch_transfers(0, 5).await.unwrap();
        let positions: Vec<(u64, u64)> = transfers
            .iter()
            .map(|t| (t.block_number, t.log_index))
            .collect();
        assert_eq!(positions, vec![(2, 0), (2, 1), (5, 0)]);
    }

    #[tokio::test]
    async fn test_latest_block_defaults_to_highest_transfer() {
        let mock = MockTransferSource::new().with_transfer(transfer(7, 0));
        assert_eq!(mock.latest_block().await.unwrap().number, 7);

        let pinned = mock.with_latest_block(100, UnixSeconds::new(1_700_000_000));
        let head = pinned.latest_block().await.unwrap();
        assert_eq!(head.number, 100);
        assert_eq!(head.timestamp, UnixSeconds::new(1_700_000_000));
    }

    #[tokio::test]
    async fn test_total_supply() {
        let mock = MockTransferSource::new().with_total_supply(Amount::from(42u64));
        assert_eq!(mock.total_supply(1).await.unwrap(), Amount::from(42u64));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let mock = MockTransferSource::new().unavailable("down");
        assert!(matches!(
            mock.latest_block().await,
            Err(SourceError::Unavailable(_))
        ));
        assert!(mock.fetch_transfers(0, 1).await.is_err());
        assert!(mock.total_supply(0).await.is_err());
    }
}
