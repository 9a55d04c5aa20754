//! Layered merkle tree over an ordered leaf sequence.

use super::hashing::{hash_leaf, hash_pair};
use super::MerkleError;
use crate::domain::{Address, Amount, Hash256, MerkleLeaf};
use std::collections::HashMap;

/// Sole leaf of a tree built from no allocations.
pub const PLACEHOLDER_ADDRESS: Address = {
    let mut bytes = [0u8; 20];
    bytes[19] = 1;
    Address::from_bytes(bytes)
};

pub fn placeholder_leaf() -> MerkleLeaf {
    MerkleLeaf::new(PLACEHOLDER_ADDRESS, Amount::ZERO)
}

/// Immutable merkle tree.
///
/// `layers[0]` holds the leaf hashes in insertion order and the last layer
/// holds only the root. A layer of odd length pairs its last node with
/// itself; the verifier needs no special case because the sibling it sees
/// is just that node repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    leaves: Vec<MerkleLeaf>,
    layers: Vec<Vec<Hash256>>,
    positions: HashMap<Address, usize>,
    placeholder: bool,
}

impl MerkleTree {
    /// Build from `leaves` in the given order.
    ///
    /// An empty input yields a tree over [`placeholder_leaf`]. Repeated
    /// addresses are rejected since an address is the proof lookup key.
    pub fn build(leaves: Vec<MerkleLeaf>) -> Result<Self, MerkleError> {
        let placeholder = leaves.is_empty();
        let leaves = if placeholder {
            vec![placeholder_leaf()]
        } else {
            leaves
        };

        let mut positions = HashMap::with_capacity(leaves.len());
        for (i, leaf) in leaves.iter().enumerate() {
            if positions.insert(leaf.address, i).is_some() {
                return Err(MerkleError::DuplicateAddress(leaf.address));
            }
        }

        let mut layers = vec![leaves.iter().map(hash_leaf).collect::<Vec<_>>()];
        while layers.last().map_or(false, |layer| layer.len() > 1) {
            let current = &layers[layers.len() - 1];
            let next = current
                .chunks(2)
                .map(|pair| {
                    // An odd trailing node is paired with itself.
                    let right = pair.get(1).unwrap_or(&pair[0]);
                    hash_pair(&pair[0], right)
                })
                .collect();
            layers.push(next);
        }

        Ok(Self {
            leaves,
            layers,
            positions,
            placeholder,
        })
    }

    pub fn root(&self) -> Hash256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Leaves actually hashed, including the placeholder if present.
    pub fn leaves(&self) -> &[MerkleLeaf] {
        &self.leaves
    }

    /// Number of real allocations.
    pub fn leaf_count(&self) -> usize {
        if self.placeholder {
            0
        } else {
            self.leaves.len()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn position(&self, address: &Address) -> Option<usize> {
        self.positions.get(address).copied()
    }

    pub fn leaf(&self, index: usize) -> Option<&MerkleLeaf> {
        self.leaves.get(index)
    }

    /// Sibling hashes from leaf `index` up to (excluding) the root.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash256>> {
        if index >= self.leaves.len() {
            return None;
        }
        let mut proof = Vec::with_capacity(self.depth());
        let mut idx = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = layer.get(idx ^ 1).unwrap_or(&layer[idx]);
            proof.push(*sibling);
            idx /= 2;
        }
        Some(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::super::hashing::{leaf_hash, verify_proof};
    use super::*;

    fn leaves(n: u8) -> Vec<MerkleLeaf> {
        (1..=n)
            .map(|i| MerkleLeaf::new(Address::from_bytes([i; 20]), Amount::from(i as u64 * 10)))
            .collect()
    }

    #[test]
    fn test_single_leaf_root_is_leaf_hash() {
        let tree = MerkleTree::build(leaves(1)).unwrap();
        let leaf = tree.leaf(0).unwrap();
        assert_eq!(tree.root(), leaf_hash(&leaf.address, &leaf.amount));
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.proof(0), Some(vec![]));
    }

    #[test]
    fn test_two_leaf_root() {
        let tree = MerkleTree::build(leaves(2)).unwrap();
        let h0 = hash_leaf(tree.leaf(0).unwrap());
        let h1 = hash_leaf(tree.leaf(1).unwrap());
        assert_eq!(tree.root(), hash_pair(&h0, &h1));
        assert_eq!(tree.proof(0), Some(vec![h1]));
        assert_eq!(tree.proof(1), Some(vec![h0]));
    }

    #[test]
    fn test_odd_layer_duplicates_last_node() {
        let tree = MerkleTree::build(leaves(3)).unwrap();
        let h: Vec<Hash256> = tree.leaves().iter().map(hash_leaf).collect();
        let left = hash_pair(&h[0], &h[1]);
        let right = hash_pair(&h[2], &h[2]);
        assert_eq!(tree.root(), hash_pair(&left, &right));
        assert_eq!(tree.proof(2), Some(vec![h[2], left]));
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=17u8 {
            let tree = MerkleTree::build(leaves(n)).unwrap();
            for (i, leaf) in tree.leaves().iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                assert!(
                    verify_proof(&tree.root(), &proof, &leaf.address, &leaf.amount),
                    "leaf {} of {} failed",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn test_moving_leaves_across_pairs_changes_root() {
        let forward = MerkleTree::build(leaves(4)).unwrap();
        let source = leaves(4);
        let regrouped = vec![
            source[0],
            source[2],
            source[1],
            source[3],
        ];
        let regrouped = MerkleTree::build(regrouped).unwrap();
        assert_ne!(forward.root(), regrouped.root());
    }

    #[test]
    fn test_order_within_pairs_and_reversal_keep_root() {
        let forward = MerkleTree::build(leaves(4)).unwrap();
        let source = leaves(4);
        let swapped = vec![
            source[1],
            source[0],
            source[3],
            source[2],
        ];
        assert_eq!(MerkleTree::build(swapped).unwrap().root(), forward.root());

        let mut reversed = leaves(4);
        reversed.reverse();
        assert_eq!(MerkleTree::build(reversed).unwrap().root(), forward.root());
    }

    #[test]
    fn test_empty_builds_placeholder() {
        let tree = MerkleTree::build(vec![]).unwrap();
        assert!(tree.is_placeholder());
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.leaves(), &[placeholder_leaf()]);
        assert_eq!(
            tree.root(),
            leaf_hash(&PLACEHOLDER_ADDRESS, &Amount::ZERO)
        );
        assert_eq!(
            PLACEHOLDER_ADDRESS.to_string(),
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_duplicate_address_rejected() {
        let mut input = leaves(2);
        input.push(MerkleLeaf::new(input[0].address, Amount::from(1u64)));
        assert_eq!(
            MerkleTree::build(input.clone()),
            Err(MerkleError::DuplicateAddress(input[0].address))
        );
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = MerkleTree::build(leaves(2)).unwrap();
        assert_eq!(tree.proof(2), None);
    }

    #[test]
    fn test_depth_is_ceil_log2() {
        assert_eq!(MerkleTree::build(leaves(2)).unwrap().depth(), 1);
        assert_eq!(MerkleTree::build(leaves(5)).unwrap().depth(), 3);
        assert_eq!(MerkleTree::build(leaves(8)).unwrap().depth(), 3);
        assert_eq!(MerkleTree::build(leaves(9)).unwrap().depth(), 4);
    }
}
