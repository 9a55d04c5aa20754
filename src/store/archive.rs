//! Durable copies of snapshots and exported trees.

use crate::domain::Snapshot;
use crate::error::ErrorKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("archive entry not found: {0}")]
    NotFound(String),
    #[error("invalid archive key: {0}")]
    InvalidKey(String),
    #[error("no archive configured")]
    Unconfigured,
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::NotFound(_) => ErrorKind::NotFound,
            ArchiveError::InvalidKey(_) | ArchiveError::Serialize(_) => ErrorKind::InvalidInput,
            ArchiveError::Io(_) | ArchiveError::Unconfigured => ErrorKind::Unavailable,
        }
    }
}

/// Write-once blob store. Each `put_*` returns the key to read it back.
#[async_trait]
pub trait ArchiveStore: Send + Sync + fmt::Debug {
    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<String, ArchiveError>;

    /// Store an exported tree document.
    async fn put_tree(&self, tree_id: &str, export_json: &str) -> Result<String, ArchiveError>;

    /// Fetch a tree document stored by [`ArchiveStore::put_tree`].
    async fn get_tree(&self, key: &str) -> Result<String, ArchiveError>;
}

pub fn snapshot_key(snapshot_id: &str) -> String {
    format!("snapshots/{}.json", snapshot_id)
}

pub fn tree_key(tree_id: &str) -> String {
    format!("trees/{}.json", tree_id)
}

/// Keys are relative paths of plain components.
fn validate_key(key: &str) -> Result<&Path, ArchiveError> {
    let path = Path::new(key);
    let plain = !key.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(ArchiveError::InvalidKey(key.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryArchive {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: String, body: String) -> String {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), body);
        key
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<String, ArchiveError> {
        let body = serde_json::to_string(snapshot)?;
        Ok(self.put(snapshot_key(snapshot.id()), body))
    }

    async fn put_tree(&self, tree_id: &str, export_json: &str) -> Result<String, ArchiveError> {
        Ok(self.put(tree_key(tree_id), export_json.to_string()))
    }

    async fn get_tree(&self, key: &str) -> Result<String, ArchiveError> {
        validate_key(key)?;
        self.get(key).ok_or_else(|| ArchiveError::NotFound(key.to_string()))
    }
}

/// JSON files under a root directory.
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn write(&self, key: String, body: &[u8]) -> Result<String, ArchiveError> {
        let path = self.root.join(validate_key(&key)?);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        debug!(path = %path.display(), bytes = body.len(), "archived");
        Ok(key)
    }
}

#[async_trait]
impl ArchiveStore for FsArchive {
    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<String, ArchiveError> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        self.write(snapshot_key(snapshot.id()), &body).await
    }

    async fn put_tree(&self, tree_id: &str, export_json: &str) -> Result<String, ArchiveError> {
        self.write(tree_key(tree_id), export_json.as_bytes()).await
    }

    async fn get_tree(&self, key: &str) -> Result<String, ArchiveError> {
        let path = self.root.join(validate_key(key)?);
        match tokio::fs::read_to_string(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArchiveError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amount, SnapshotSummary, UnixSeconds};

    fn snapshot(id: &str) -> Snapshot {
        Snapshot {
            summary: SnapshotSummary {
                id: id.to_string(),
                block_number: 10,
                timestamp: UnixSeconds::new(1_700_000_000),
                total_holders: 0,
                total_supply_held: Amount::ZERO,
                chain_id: 84532,
            },
            holders: vec![],
        }
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("trees/tree_1.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("trees/../../x").is_err());
    }

    #[tokio::test]
    async fn test_memory_archive() {
        let archive = MemoryArchive::new();
        let key = archive.put_snapshot(&snapshot("snap_1")).await.unwrap();
        assert_eq!(key, "snapshots/snap_1.json");

        let key = archive.put_tree("tree_1", "{}").await.unwrap();
        assert_eq!(archive.get_tree(&key).await.unwrap(), "{}");
        assert_eq!(archive.len(), 2);
        assert!(matches!(
            archive.get_tree("trees/missing.json").await,
            Err(ArchiveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_archive_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());

        let key = archive.put_snapshot(&snapshot("snap_1")).await.unwrap();
        let body = std::fs::read_to_string(dir.path().join(&key)).unwrap();
        let back: Snapshot = serde_json::from_str(&body).unwrap();
        assert_eq!(back, snapshot("snap_1"));

        let key = archive.put_tree("tree_1", "{\"version\":1}").await.unwrap();
        assert_eq!(archive.get_tree(&key).await.unwrap(), "{\"version\":1}");
    }

    #[tokio::test]
    async fn test_fs_archive_missing_and_invalid_keys() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FsArchive::new(dir.path());
        let err = archive.get_tree("trees/missing.json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = archive.get_tree("../outside.json").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
