//! Transfer logs exported as CSV, optionally lz4-framed.
//!
//! Expected header: `from,to,value,block_number,log_index`. `log_index` may
//! be omitted and defaults to 0. Files ending in `.lz4` are decompressed
//! before parsing.

use super::{BlockHeader, SourceError, TransferSource};
use crate::domain::{sort_transfers, Amount, BlockNumber, TransferEvent, UnixSeconds};
use async_trait::async_trait;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the whole log on each call; the file is the source of truth and
/// may grow between calls.
#[derive(Debug, Clone)]
pub struct CsvTransferSource {
    path: PathBuf,
    total_supply: Amount,
}

impl CsvTransferSource {
    /// CSV logs carry no supply figure, so it is supplied here.
    pub fn new(path: impl Into<PathBuf>, total_supply: Amount) -> Self {
        Self {
            path: path.into(),
            total_supply,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_lz4(&self) -> bool {
        self.path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("lz4"))
    }

    pub fn decompress_lz4_frame(lz4_bytes: &[u8]) -> Result<Vec<u8>, SourceError> {
        let mut decoder = lz4_flex::frame::FrameDecoder::new(lz4_bytes);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| SourceError::Lz4(e.to_string()))?;
        Ok(out)
    }

    /// Parse rows in file order. Fails on the first malformed row; row
    /// numbers count the header as row 1.
    pub fn parse_csv(csv_bytes: &[u8]) -> Result<Vec<TransferEvent>, SourceError> {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            from: Option<String>,
            to: Option<String>,
            value: Option<String>,
            block_number: BlockNumber,
            #[serde(default)]
            log_index: Option<u64>,
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_bytes);

        let mut transfers = Vec::new();
        for (i, record) in reader.deserialize::<Row>().enumerate() {
            let row = record.map_err(|e| SourceError::Csv(e.to_string()))?;
            let event = TransferEvent::parse(
                row.from.as_deref(),
                row.to.as_deref(),
                row.value.as_deref(),
                row.block_number,
                row.log_index.unwrap_or(0),
            )
            .map_err(|source| SourceError::InvalidRow { row: i + 2, source })?;
            transfers.push(event);
        }
        Ok(transfers)
    }

    /// Load, decode and order the full log.
    pub async fn load(&self) -> Result<Vec<TransferEvent>, SourceError> {
        let raw = tokio::fs::read(&self.path).await?;
        let csv = if self.is_lz4() {
            Self::decompress_lz4_frame(&raw)?
        } else {
            raw
        };
        let mut transfers = Self::parse_csv(&csv)?;
        sort_transfers(&mut transfers);
        debug!(path = %self.path.display(), rows = transfers.len(), "loaded transfer log");
        Ok(transfers)
    }
}

#[async_trait]
impl TransferSource for CsvTransferSource {
    /// Highest block present in the log, stamped with the current time.
    async fn latest_block(&self) -> Result<BlockHeader, SourceError> {
        let transfers = self.load().await?;
        Ok(BlockHeader {
            number: transfers.last().map_or(0, |t| t.block_number),
            timestamp: UnixSeconds::now(),
        })
    }

    async fn fetch_transfers(
        &self,
        from_block: BlockNumber,
        to_block: BlockNumber,
    ) -> Result<Vec<TransferEvent>, SourceError> {
        let mut transfers = self.load().await?;
        transfers.retain(|t| t.block_number >= from_block && t.block_number <= to_block);
        Ok(transfers)
    }

    async fn total_supply(&self, _at_block: BlockNumber) -> Result<Amount, SourceError> {
        Ok(self.total_supply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, TransferParseError};
    use std::io::Write;
    use std::str::FromStr;

    const HEADER: &str = "from,to,value,block_number,log_index\n";
    const A: &str = "0x1111111111111111111111111111111111111111";
    const B: &str = "0x2222222222222222222222222222222222222222";
    const ZERO: &str = "0x0000000000000000000000000000000000000000";

    fn compress_lz4_frame(input: &[u8]) -> Vec<u8> {
        let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
        encoder.write_all(input).unwrap();
        encoder.finish().unwrap()
    }

    fn sample_csv() -> String {
        format!(
            "{HEADER}{A},{B},40,2,0\n{ZERO},{A},100,1,3\n"
        )
    }

    #[test]
    fn test_parse_csv_rows() {
        let transfers = CsvTransferSource::parse_csv(sample_csv().as_bytes()).unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from, Address::from_str(A).unwrap());
        assert_eq!(transfers[0].value, Amount::from(40u64));
        assert!(transfers[1].is_mint());
        assert_eq!(transfers[1].log_index, 3);
    }

    #[test]
    fn test_parse_csv_defaults_log_index() {
        let csv = format!("from,to,value,block_number\n{ZERO},{A},5,1\n");
        let transfers = CsvTransferSource::parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(transfers[0].log_index, 0);
    }

    #[test]
    fn test_parse_csv_reports_bad_row() {
        let csv = format!("{HEADER}{ZERO},{A},5,1,0\n{A},0x12,5,2,0\n");
        let err = CsvTransferSource::parse_csv(csv.as_bytes()).unwrap_err();
        match err {
            SourceError::InvalidRow { row, source } => {
                assert_eq!(row, 3);
                assert!(matches!(source, TransferParseError::Address { field: "to", .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_csv_rejects_negative_value() {
        let csv = format!("{HEADER}{ZERO},{A},-5,1,0\n");
        assert!(matches!(
            CsvTransferSource::parse_csv(csv.as_bytes()),
            Err(SourceError::InvalidRow { row: 2, .. })
        ));
    }

    #[test]
    fn test_parse_csv_rejects_bad_block_number() {
        let csv = format!("{HEADER}{ZERO},{A},5,notablock,0\n");
        assert!(matches!(
            CsvTransferSource::parse_csv(csv.as_bytes()),
            Err(SourceError::Csv(_))
        ));
    }

    #[test]
    fn test_lz4_decompress_round_trip() {
        let csv = sample_csv();
        let lz4 = compress_lz4_frame(csv.as_bytes());
        let out = CsvTransferSource::decompress_lz4_frame(&lz4).unwrap();
        assert_eq!(out, csv.as_bytes());
    }

    #[tokio::test]
    async fn test_load_plain_csv_in_chain_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transfers.csv");
        std::fs::write(&path, sample_csv()).unwrap();

        let source = CsvTransferSource::new(&path, Amount::from(100u64));
        let transfers = source.fetch_transfers(0, u64::MAX).await.unwrap();
        assert_eq!(transfers[0].block_number, 1);
        assert_eq!(transfers[1].block_number, 2);
        assert_eq!(source.latest_block().await.unwrap().number, 2);
        assert_eq!(source.total_supply(2).await.unwrap(), Amount::from(100u64));
    }

    #[tokio::test]
    async fn test_load_lz4_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transfers.csv.lz4");
        std::fs::write(&path, compress_lz4_frame(sample_csv().as_bytes())).unwrap();

        let source = CsvTransferSource::new(&path, Amount::from(100u64));
        let transfers = source.fetch_transfers(0, 1).await.unwrap();
        assert_eq!(transfers.len(), 1);
        assert!(transfers[0].is_mint());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvTransferSource::new(dir.path().join("absent.csv"), Amount::from(1u64));
        assert!(matches!(
            source.latest_block().await,
            Err(SourceError::Io(_))
        ));
    }
}
