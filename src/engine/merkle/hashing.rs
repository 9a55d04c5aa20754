//! Leaf encoding and sorted-pair node hashing.
//!
//! These byte layouts are what the on-chain verifier recomputes:
//!
//! - leaf: `keccak256(abi.encodePacked(address, uint256))`, i.e. the 20
//!   address bytes followed by the amount as 32 big-endian bytes
//! - node: `keccak256(min(a, b) ++ max(a, b))` with byte-wise comparison

use crate::domain::amount::parse_amount;
use crate::domain::{parse_hash, Address, Amount, Hash256, MerkleLeaf};
use alloy_primitives::keccak256;
use std::str::FromStr;

const PACKED_LEAF_LEN: usize = 20 + 32;

/// Packed encoding of one leaf.
pub fn encode_leaf(address: &Address, amount: &Amount) -> [u8; PACKED_LEAF_LEN] {
    let mut buf = [0u8; PACKED_LEAF_LEN];
    buf[..20].copy_from_slice(address.as_bytes());
    buf[20..].copy_from_slice(&amount.to_be_bytes::<32>());
    buf
}

pub fn leaf_hash(address: &Address, amount: &Amount) -> Hash256 {
    keccak256(encode_leaf(address, amount))
}

pub fn hash_leaf(leaf: &MerkleLeaf) -> Hash256 {
    leaf_hash(&leaf.address, &leaf.amount)
}

/// Parent of two nodes. Symmetric in its arguments.
pub fn hash_pair(a: &Hash256, b: &Hash256) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Fold `proof` into `leaf`, returning the implied root.
pub fn process_proof(leaf: Hash256, proof: &[Hash256]) -> Hash256 {
    proof
        .iter()
        .fold(leaf, |computed, sibling| hash_pair(&computed, sibling))
}

/// Stateless proof check. Never fails: anything that does not reproduce
/// `root` is simply `false`.
pub fn verify_proof(
    root: &Hash256,
    proof: &[Hash256],
    address: &Address,
    amount: &Amount,
) -> bool {
    process_proof(leaf_hash(address, amount), proof) == *root
}

/// [`verify_proof`] over untrusted text input. Malformed root, proof
/// element, address or amount all yield `false`.
pub fn verify_proof_hex(root: &str, proof: &[String], address: &str, amount: &str) -> bool {
    let Some(root) = parse_hash(root) else {
        return false;
    };
    let Ok(address) = Address::from_str(address) else {
        return false;
    };
    let Ok(amount) = parse_amount(amount) else {
        return false;
    };
    let proof: Option<Vec<Hash256>> = proof.iter().map(|p| parse_hash(p)).collect();
    match proof {
        Some(proof) => verify_proof(&root, &proof, &address, &amount),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format_hash;

    fn addr(s: &str) -> Address {
        Address::from_str(s).unwrap()
    }

    #[test]
    fn test_keccak_empty_input_vector() {
        assert_eq!(
            format_hash(&keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_encode_leaf_layout() {
        let a = addr("0x00000000000000000000000000000000000000ff");
        let buf = encode_leaf(&a, &Amount::from(0x0102u64));
        assert_eq!(buf.len(), 52);
        assert_eq!(buf[19], 0xff);
        assert!(buf[..19].iter().all(|b| *b == 0));
        assert_eq!(buf[50], 0x01);
        assert_eq!(buf[51], 0x02);
        assert!(buf[20..50].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_leaf_hash_is_keccak_of_packed_encoding() {
        let a = addr("0x1111111111111111111111111111111111111111");
        let amount = Amount::from(60u64);
        let mut packed = Vec::new();
        packed.extend_from_slice(a.as_bytes());
        packed.extend_from_slice(&amount.to_be_bytes::<32>());
        assert_eq!(leaf_hash(&a, &amount), keccak256(&packed));
    }

    #[test]
    fn test_hash_pair_is_order_independent() {
        let x = Hash256::repeat_byte(0x01);
        let y = Hash256::repeat_byte(0xfe);
        assert_eq!(hash_pair(&x, &y), hash_pair(&y, &x));

        let mut concat = Vec::new();
        concat.extend_from_slice(x.as_slice());
        concat.extend_from_slice(y.as_slice());
        assert_eq!(hash_pair(&y, &x), keccak256(&concat));
    }

    #[test]
    fn test_empty_proof_verifies_single_leaf_root() {
        let a = addr("0x1111111111111111111111111111111111111111");
        let root = leaf_hash(&a, &Amount::from(7u64));
        assert!(verify_proof(&root, &[], &a, &Amount::from(7u64)));
        assert!(!verify_proof(&root, &[], &a, &Amount::from(8u64)));
    }

    #[test]
    fn test_verify_proof_hex_rejects_malformed_input() {
        let a = "0x1111111111111111111111111111111111111111";
        let root = format_hash(&leaf_hash(&addr(a), &Amount::from(7u64)));
        assert!(verify_proof_hex(&root, &[], a, "7"));
        assert!(!verify_proof_hex("0xnothex", &[], a, "7"));
        assert!(!verify_proof_hex(&root, &[], "0x1234", "7"));
        assert!(!verify_proof_hex(&root, &[], a, "-7"));
        assert!(!verify_proof_hex(&root, &["0x00".to_string()], a, "7"));
    }

    #[test]
    fn test_verify_proof_hex_accepts_mixed_case_address() {
        let lower = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";
        let upper = "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD";
        let root = format_hash(&leaf_hash(&addr(lower), &Amount::from(1u64)));
        assert!(verify_proof_hex(&root, &[], upper, "1"));
    }
}
