//! This module provides types and utilities for handling JSON Web Keys (JWKs).
//!
//! Only the key types needed for signing are modeled: elliptic-curve keys
//! (`EC`) and CFRG octet key pairs (`OKP`).

mod bytes;
mod ec;
#[allow(clippy::module_inception)]
mod jwk;
mod key;
mod okp;
mod prm;
mod secret;

// Re-exports
pub use bytes::Bytes;
pub use ec::{Ec, EcCurves};
pub use jwk::Jwk;
pub use key::Key;
pub use okp::{Okp, OkpCurves};
pub use prm::Parameters;
pub use secret::Secret;
