use thiserror::Error;

/// The set of errors that can occur during key operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Can not retrieve signature
    #[error("signature bytes are malformed")]
    CanNotRetrieveSignature,
    /// Invalid curve
    #[error("unsupported or mismatched curve")]
    InvalidCurve,
    /// Invalid key length
    #[error("invalid key length")]
    InvalidKeyLength,
    /// Invalid secret key
    #[error("invalid secret key")]
    InvalidSecretKey,
    /// The operation needs a secret key the key pair does not carry
    #[error("secret key is missing")]
    MissingSecretKey,
    /// Invalid seed
    #[error("invalid seed")]
    InvalidSeed,
    /// Invalid public key
    #[error("invalid public key")]
    InvalidPublicKey,
    /// Error while signing
    #[error("signing failed")]
    SignatureError,
    /// Error while verifying
    #[error("signature verification failed")]
    VerificationError,
    /// Failed to gather entropy from the operating system
    #[error("entropy source failure: {0}")]
    Entropy(String),
}
