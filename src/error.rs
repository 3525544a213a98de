use core::fmt::{Debug, Display};
use std::error::Error as StdError;

use did_utils::{
    crypto::Error as CryptoError,
    ldmodel::ContextError,
    methods::DIDResolutionError,
    proof::Error as ProofError,
    vc::Error as VcError,
};

/// Kind of error an operation can fail with.
///
/// Every kind maps to a stable numeric code, reported through the status channel.
#[derive(thiserror::Error, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    #[error("Key generation failed")]
    KeyGeneration,
    #[error("Invalid key")]
    InvalidKey,
    #[error("Unsupported DID method pattern")]
    UnsupportedMethod,
    #[error("Unsupported cryptosuite")]
    UnsupportedSuite,
    #[error("Invalid context")]
    InvalidContext,
    #[error("Issuance failed")]
    Issuance,
    #[error("Document does not match the preparation token")]
    TokenMismatch,
    #[error("Invalid signature format")]
    InvalidSignatureFormat,
    #[error("Preparation token already consumed")]
    TokenAlreadyConsumed,
    #[error("DID method not supported")]
    MethodNotSupported,
    #[error("DID URL dereferencing failed")]
    Dereference,
    #[error("Malformed input")]
    MalformedInput,
    #[error("Private key is missing")]
    MissingPrivateKey,
    #[error("DID resolution failed")]
    Resolution,
    /// Another error that is not categorized occurred.
    #[error("Internal error")]
    Internal,
}

impl ErrorKind {
    /// Numeric code of the kind. Zero is reserved for success.
    pub fn code(&self) -> u32 {
        match self {
            ErrorKind::KeyGeneration => 1,
            ErrorKind::InvalidKey => 2,
            ErrorKind::UnsupportedMethod => 3,
            ErrorKind::UnsupportedSuite => 4,
            ErrorKind::InvalidContext => 5,
            ErrorKind::Issuance => 6,
            ErrorKind::TokenMismatch => 7,
            ErrorKind::InvalidSignatureFormat => 8,
            ErrorKind::TokenAlreadyConsumed => 9,
            ErrorKind::MethodNotSupported => 10,
            ErrorKind::Dereference => 11,
            ErrorKind::MalformedInput => 12,
            ErrorKind::MissingPrivateKey => 13,
            ErrorKind::Resolution => 14,
            ErrorKind::Internal => 15,
        }
    }
}

/// Represents all possible errors that can occur in toolkit operations.
pub struct Error {
    kind: ErrorKind,
    source: eyre::Report,
}

impl Error {
    /// Returns the kind of the error that occurred.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Shorthand for `self.kind().code()`.
    pub fn code(&self) -> u32 {
        self.kind.code()
    }

    /// Returns the lowest level error that caused this error.
    pub fn source(&self) -> &(dyn StdError + 'static) {
        self.source.root_cause()
    }

    /// Returns the context of the error.
    pub fn context(&self) -> &(dyn StdError) {
        self.source.as_ref()
    }

    pub(crate) fn new<E>(kind: ErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            kind,
            source: eyre::Report::new(source),
        }
    }

    pub(crate) fn msg<M>(kind: ErrorKind, msg: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Error {
            kind,
            source: eyre::Report::msg(msg),
        }
    }

    /// Re-labels the error under another kind, keeping its cause chain.
    pub(crate) fn wrap<M>(self, kind: ErrorKind, msg: M) -> Self
    where
        M: Display + Send + Sync + 'static,
    {
        Error {
            kind,
            source: self.source.wrap_err(msg),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("context", &self.context())
            .field("source", &self.source())
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.kind, self.source)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Internal, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::MalformedInput, err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        let kind = match err {
            CryptoError::MissingSecretKey => ErrorKind::MissingPrivateKey,
            _ => ErrorKind::InvalidKey,
        };
        Error::new(kind, err)
    }
}

impl From<ContextError> for Error {
    fn from(err: ContextError) -> Self {
        Error::new(ErrorKind::InvalidContext, err)
    }
}

impl From<VcError> for Error {
    fn from(err: VcError) -> Self {
        Error::new(ErrorKind::MalformedInput, err)
    }
}

impl From<ProofError> for Error {
    fn from(err: ProofError) -> Self {
        let kind = match &err {
            ProofError::UnsupportedSuite(_) => ErrorKind::UnsupportedSuite,
            ProofError::Context(_) => ErrorKind::InvalidContext,
            ProofError::InvalidDocument | ProofError::MalformedProof(_) => ErrorKind::MalformedInput,
            ProofError::InvalidProofValue(_) => ErrorKind::InvalidSignatureFormat,
            ProofError::Crypto(CryptoError::MissingSecretKey) => ErrorKind::MissingPrivateKey,
            ProofError::Canonicalization(_) | ProofError::Crypto(_) | ProofError::InvalidSignature => {
                ErrorKind::Issuance
            }
        };
        Error::new(kind, err)
    }
}

impl From<DIDResolutionError> for Error {
    fn from(err: DIDResolutionError) -> Self {
        let kind = match err {
            DIDResolutionError::MethodNotSupported => ErrorKind::MethodNotSupported,
            DIDResolutionError::InvalidDid | DIDResolutionError::InvalidDidUrl => ErrorKind::MalformedInput,
            _ => ErrorKind::Resolution,
        };
        Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
