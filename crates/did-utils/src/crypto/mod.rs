//! This module contains cryptographic utilities.
//!
//! Provides interfaces and implementations for asymmetric key management,
//! including key generation, signing and verification over [Ed25519], [P-256],
//! [secp256k1] and [P-384], plus [SHA-2] hashing.
//!
//! [Ed25519]: https://en.wikipedia.org/wiki/EdDSA
//! [P-256]: https://neuromancer.sk/std/nist/P-256
//! [secp256k1]: https://en.bitcoin.it/wiki/Secp256k1
//! [P-384]: https://neuromancer.sk/std/nist/P-384
//! [SHA-2]: https://en.wikipedia.org/wiki/SHA-2

pub(crate) mod alg;
mod ecdsa;
mod ed25519;
mod errors;
mod format;
mod hash;
mod key;
mod traits;
mod utils;

pub use alg::{decode_multikey, Algorithm, DecodeMultikeyError};
pub use ecdsa::{P256KeyPair, P384KeyPair, Secp256k1KeyPair};
pub use ed25519::Ed25519KeyPair;
pub use errors::Error;
pub use format::PublicKeyFormat;
pub use hash::{sha256_hash, sha384_hash};
pub use key::{Curve, KeyPair};
pub use traits::{CoreSign, Generate, KeyMaterial, ToMultikey};

/// A wrapper struct for an asymmetric key pair.
/// This struct holds a public key and an optional secret key.
#[derive(Clone)]
pub struct AsymmetricKey<P, S> {
    pub public_key: P,
    pub secret_key: Option<S>,
}
