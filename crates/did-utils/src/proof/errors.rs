use thiserror::Error;

use crate::{crypto::Error as CryptoError, ldmodel::ContextError};

/// Errors raised while creating or checking Data Integrity proofs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// No cryptosuite handles the key, or the requested one disagrees with it
    #[error("unsupported cryptosuite: {0}")]
    UnsupportedSuite(String),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("document must be a JSON object")]
    InvalidDocument,
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The proof value is absent or not a base58btc multibase signature of the suite's size
    #[error("invalid proof value: {0}")]
    InvalidProofValue(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// The signature is well formed but does not match the document
    #[error("signature verification failed")]
    InvalidSignature,
}
