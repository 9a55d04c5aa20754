//! Identifier generation.

use crate::domain::UnixSeconds;
use sha2::{Digest, Sha256};

/// `<prefix>_<unix seconds>_<8 random hex chars>`.
pub fn generate_id(prefix: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}", prefix, UnixSeconds::now().as_i64(), &random[..8])
}

/// First 16 hex chars of SHA-256 over the concatenated inputs.
pub fn deterministic_id<I, S>(inputs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input.as_ref());
    }
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
