//! Merkle distribution trees.
//!
//! This module provides:
//! - Sorted-pair keccak hashing and proof verification (`hashing`)
//! - The pure layered tree (`tree`)
//! - `MerkleEngine`, which builds, publishes, exports and imports trees
//!   against an injected [`TreeRegistry`]

pub mod hashing;
pub mod tree;

pub use hashing::{hash_pair, leaf_hash, verify_proof, verify_proof_hex};
pub use tree::{placeholder_leaf, MerkleTree, PLACEHOLDER_ADDRESS};

use crate::domain::{
    format_hash, Address, Amount, Hash256, Holder, MerkleLeaf, MerkleProof, TreeMetadata,
    UnixSeconds,
};
use crate::engine::airstream::{self, AirstreamAllocation, AirstreamError};
use crate::error::ErrorKind;
use crate::id::generate_id;
use crate::store::TreeRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One leaf per holder carrying its balance, in snapshot order.
pub fn holder_leaves(holders: &[Holder]) -> Vec<MerkleLeaf> {
    holders
        .iter()
        .map(|h| MerkleLeaf::new(h.address, h.balance))
        .collect()
}

pub const EXPORT_FORMAT: &str = "sorted-pair-keccak256";
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("tree not found: {0}")]
    TreeNotFound(String),
    #[error("address {address} is not in tree {tree_id}")]
    AddressNotInTree { tree_id: String, address: Address },
    #[error("duplicate leaf address: {0}")]
    DuplicateAddress(Address),
    #[error("tree id already registered: {0}")]
    DuplicateTree(String),
    #[error("invalid tree export: {0}")]
    InvalidExport(String),
    #[error("unsupported export format {format} version {version}")]
    UnsupportedFormat { format: String, version: u32 },
    #[error("root mismatch: document states {expected}, leaves hash to {computed}")]
    RootMismatch { expected: String, computed: String },
}

impl MerkleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MerkleError::TreeNotFound(_) | MerkleError::AddressNotInTree { .. } => {
                ErrorKind::NotFound
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// A built tree together with the metadata it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTree {
    pub metadata: TreeMetadata,
    pub tree: MerkleTree,
}

impl StoredTree {
    /// Attach an archive location before publishing.
    pub fn with_archive_key(mut self, key: impl Into<String>) -> Self {
        self.metadata.archive_key = Some(key.into());
        self
    }

    pub fn export(&self) -> TreeExport {
        TreeExport {
            format: EXPORT_FORMAT.to_string(),
            version: EXPORT_VERSION,
            leaf_encoding: "keccak256(abi.encodePacked(address, uint256))".to_string(),
            node_hashing: "keccak256(min(a, b) ++ max(a, b))".to_string(),
            odd_layer: "duplicate-last".to_string(),
            root: self.tree.root(),
            leaf_count: self.tree.leaf_count(),
            leaves: self.tree.leaves().to_vec(),
        }
    }
}

/// Self-describing tree document.
///
/// `leaves` is the exact hashed sequence, so a placeholder tree exports its
/// single placeholder leaf with `leafCount` 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeExport {
    pub format: String,
    pub version: u32,
    pub leaf_encoding: String,
    pub node_hashing: String,
    pub odd_layer: String,
    #[serde(with = "crate::domain::merkle::hash_hex")]
    pub root: Hash256,
    pub leaf_count: usize,
    pub leaves: Vec<MerkleLeaf>,
}

impl TreeExport {
    pub fn to_json(&self) -> Result<String, MerkleError> {
        serde_json::to_string_pretty(self).map_err(|e| MerkleError::InvalidExport(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, MerkleError> {
        serde_json::from_str(json).map_err(|e| MerkleError::InvalidExport(e.to_string()))
    }

    /// Rebuild the tree and check it against the stated root and count.
    pub fn rebuild(&self) -> Result<MerkleTree, MerkleError> {
        if self.format != EXPORT_FORMAT || self.version != EXPORT_VERSION {
            return Err(MerkleError::UnsupportedFormat {
                format: self.format.clone(),
                version: self.version,
            });
        }

        let is_placeholder = self.leaf_count == 0
            && self.leaves.len() == 1
            && self.leaves[0] == placeholder_leaf();
        let leaves = if is_placeholder {
            Vec::new()
        } else {
            self.leaves.clone()
        };
        if leaves.is_empty() && !is_placeholder {
            return Err(MerkleError::InvalidExport("document has no leaves".to_string()));
        }

        let tree = MerkleTree::build(leaves)?;
        if tree.leaf_count() != self.leaf_count {
            return Err(MerkleError::InvalidExport(format!(
                "leafCount {} does not match {} leaves",
                self.leaf_count,
                tree.leaf_count()
            )));
        }
        if tree.root() != self.root {
            return Err(MerkleError::RootMismatch {
                expected: format_hash(&self.root),
                computed: format_hash(&tree.root()),
            });
        }
        Ok(tree)
    }
}

/// Builds and serves distribution trees.
#[derive(Clone)]
pub struct MerkleEngine {
    registry: Arc<TreeRegistry>,
}

impl MerkleEngine {
    pub fn new(registry: Arc<TreeRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TreeRegistry> {
        &self.registry
    }

    /// Build a tree without publishing it.
    pub fn prepare_tree(
        &self,
        snapshot_id: &str,
        leaves: Vec<MerkleLeaf>,
    ) -> Result<StoredTree, MerkleError> {
        let tree = MerkleTree::build(leaves)?;
        if tree.is_placeholder() {
            warn!(snapshot_id, "no allocations, building placeholder tree");
        }
        debug!(
            snapshot_id,
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            "built merkle tree"
        );
        let metadata = TreeMetadata {
            id: generate_id("tree"),
            snapshot_id: snapshot_id.to_string(),
            root: tree.root(),
            leaf_count: tree.leaf_count(),
            created_at: UnixSeconds::now(),
            archive_key: None,
        };
        Ok(StoredTree { metadata, tree })
    }

    /// Publish a prepared tree. Trees are immutable once registered.
    pub fn publish(&self, stored: StoredTree) -> Result<TreeMetadata, MerkleError> {
        let id = stored.metadata.id.clone();
        let published = self
            .registry
            .insert(id, stored)
            .map_err(|occupied| MerkleError::DuplicateTree(occupied.0))?;
        info!(
            tree_id = %published.metadata.id,
            snapshot_id = %published.metadata.snapshot_id,
            root = %format_hash(&published.metadata.root),
            leaves = published.metadata.leaf_count,
            "published merkle tree"
        );
        Ok(published.metadata.clone())
    }

    pub fn generate_tree(
        &self,
        snapshot_id: &str,
        leaves: Vec<MerkleLeaf>,
    ) -> Result<TreeMetadata, MerkleError> {
        let stored = self.prepare_tree(snapshot_id, leaves)?;
        self.publish(stored)
    }

    fn stored(&self, tree_id: &str) -> Result<Arc<StoredTree>, MerkleError> {
        self.registry
            .get(tree_id)
            .ok_or_else(|| MerkleError::TreeNotFound(tree_id.to_string()))
    }

    pub fn get_tree(&self, tree_id: &str) -> Result<TreeMetadata, MerkleError> {
        Ok(self.stored(tree_id)?.metadata.clone())
    }

    pub fn get_proof(&self, tree_id: &str, address: &Address) -> Result<MerkleProof, MerkleError> {
        let stored = self.stored(tree_id)?;
        let not_in_tree = || MerkleError::AddressNotInTree {
            tree_id: tree_id.to_string(),
            address: *address,
        };
        if stored.tree.is_placeholder() {
            return Err(not_in_tree());
        }
        let index = stored.tree.position(address).ok_or_else(not_in_tree)?;
        let leaf = stored.tree.leaf(index).ok_or_else(not_in_tree)?;
        let proof = stored.tree.proof(index).ok_or_else(not_in_tree)?;
        Ok(MerkleProof {
            address: leaf.address,
            amount: leaf.amount,
            proof,
        })
    }

    /// Stateless; see [`hashing::verify_proof`].
    pub fn verify_proof(
        root: &Hash256,
        proof: &[Hash256],
        address: &Address,
        amount: &Amount,
    ) -> bool {
        hashing::verify_proof(root, proof, address, amount)
    }

    /// Real allocations in tree order. Empty for a placeholder tree.
    pub fn get_leaves(&self, tree_id: &str) -> Result<Vec<MerkleLeaf>, MerkleError> {
        let stored = self.stored(tree_id)?;
        if stored.tree.is_placeholder() {
            return Ok(Vec::new());
        }
        Ok(stored.tree.leaves().to_vec())
    }

    pub fn export_tree(&self, tree_id: &str) -> Result<String, MerkleError> {
        self.stored(tree_id)?.export().to_json()
    }

    /// Rebuild a tree from an exported document and publish it under
    /// `metadata.id`. The document's root is authoritative; `metadata.root`
    /// and `metadata.leaf_count` are overwritten with the rebuilt values.
    pub fn import_tree(
        &self,
        json: &str,
        metadata: TreeMetadata,
    ) -> Result<TreeMetadata, MerkleError> {
        let export = TreeExport::from_json(json)?;
        let tree = export.rebuild()?;
        let metadata = TreeMetadata {
            root: tree.root(),
            leaf_count: tree.leaf_count(),
            ..metadata
        };
        self.publish(StoredTree { metadata, tree })
    }

    pub fn calculate_airstream_amounts(
        holders: &[Holder],
        total_airdrop: Amount,
    ) -> Result<AirstreamAllocation, AirstreamError> {
        airstream::calculate_airstream_amounts(holders, total_airdrop)
    }
}
