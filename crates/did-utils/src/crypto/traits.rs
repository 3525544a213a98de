//! Traits for cryptographic operations.

// This module designs an interface common to all curves, so that we can change the curve
// without altering consuming modules.

use super::errors::Error;

/// A trait for types that hold key material bytes.
pub trait KeyMaterial {
    /// Returns the public key bytes, in compressed form for elliptic curves.
    fn public_key_bytes(&self) -> Result<Vec<u8>, Error>;

    /// Returns the secret key bytes.
    ///
    /// Fails with [`Error::MissingSecretKey`] for public-only key pairs.
    fn private_key_bytes(&self) -> Result<Vec<u8>, Error>;
}

/// A trait for types that support deterministic key generation.
pub trait Generate: KeyMaterial {
    /// Generates a new random key.
    fn new() -> Result<Self, Error>
    where
        Self: Sized;

    /// Generates a new key deterministically using the given seed.
    ///
    /// An empty seed falls back to fresh randomness.
    fn new_with_seed(seed: &[u8]) -> Result<Self, Error>
    where
        Self: Sized;

    /// Generates a new instance from an existing public key.
    fn from_public_key(public_key: &[u8]) -> Result<Self, Error>
    where
        Self: Sized;

    /// Generates a new instance from an existing secret key.
    fn from_secret_key(secret_key: &[u8]) -> Result<Self, Error>
    where
        Self: Sized;
}

/// A trait for types that support signature operations.
pub trait CoreSign {
    /// Performs a sign operation.
    ///
    /// Returns a `Result` containing the signature, or an `Error` if the operation fails.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error>;

    /// Performs a verify operation.
    ///
    /// Returns a `Result` containing `()`, or an `Error` if the operation fails.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error>;
}

/// A trait for types that can be encoded as a [multikey].
///
/// [multikey]: https://www.w3.org/TR/controller-document/#multikey
pub trait ToMultikey {
    fn to_multikey(&self) -> String;
}
