//! This module provides utilities for creating and verifying Data Integrity proofs.
//!
//! Documents are canonicalized with [JCS] and signed with the cryptosuite
//! matching the key's curve (see [`Suite`]).
//!
//! [JCS]: https://www.rfc-editor.org/rfc/rfc8785

pub mod data_integrity;
pub mod errors;
pub mod model;
pub mod suite;
pub mod traits;

// public re-exports
pub use data_integrity::{
    canonicalize_document, canonicalize_proof, configure, decode_proof_value, encode_proof_value, hash_data,
    DataIntegrity, HashData,
};
pub use errors::Error;
pub use model::{detach_proofs, embed_proof, Domain, Proof, Proofs, PROOF_TYPE_DATA_INTEGRITY_PROOF};
pub use suite::{is_known_cryptosuite, Suite};
pub use traits::CryptoProof;
