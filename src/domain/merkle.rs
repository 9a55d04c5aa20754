//! Merkle leaves, proofs and tree metadata.

use super::primitives::{Address, Amount, UnixSeconds};
use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 32-byte keccak digest.
pub type Hash256 = B256;

/// One allocation in a distribution tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleLeaf {
    pub address: Address,
    #[serde(with = "crate::domain::amount")]
    pub amount: Amount,
}

impl MerkleLeaf {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }
}

/// Inclusion proof for one leaf, siblings ordered leaf to root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    pub address: Address,
    #[serde(with = "crate::domain::amount")]
    pub amount: Amount,
    #[serde(with = "hash_list")]
    pub proof: Vec<Hash256>,
}

/// Metadata for a published tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMetadata {
    pub id: String,
    pub snapshot_id: String,
    #[serde(with = "hash_hex")]
    pub root: Hash256,
    /// Number of real allocations. Zero for a placeholder tree.
    pub leaf_count: usize,
    pub created_at: UnixSeconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_key: Option<String>,
}

/// `0x`-prefixed lowercase hex.
pub fn format_hash(hash: &Hash256) -> String {
    format!("0x{}", hex::encode(hash.as_slice()))
}

/// Parse `0x`-prefixed (or bare) 64-digit hex. `None` on any malformation.
pub fn parse_hash(s: &str) -> Option<Hash256> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    if digits.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(digits, &mut bytes).ok()?;
    Some(Hash256::from(bytes))
}

pub mod hash_hex {
    use super::*;

    pub fn serialize<S: Serializer>(hash: &Hash256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_hash(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash256, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid hash: {}", s)))
    }
}

pub mod hash_list {
    use super::*;

    pub fn serialize<S: Serializer>(hashes: &[Hash256], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(hashes.iter().map(format_hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Hash256>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| {
                parse_hash(s)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid hash: {}", s)))
            })
            .collect()
    }
}
