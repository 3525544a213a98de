use sha2::{Digest, Sha256, Sha384};

/// Compute the SHA-256 digest of the given payload.
pub fn sha256_hash(payload: &[u8]) -> Vec<u8> {
    Sha256::digest(payload).to_vec()
}

/// Compute the SHA-384 digest of the given payload.
pub fn sha384_hash(payload: &[u8]) -> Vec<u8> {
    Sha384::digest(payload).to_vec()
}
