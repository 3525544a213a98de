//! A collection of methods for DID resolution and related utilities.
//!
//! This module provides functionality for resolving Decentralized Identifiers (DIDs)
//! using different DID methods including [`did:key`], [`did:jwk`], [`did:peer`] and [`did:web`],
//! and a [`MethodRegistry`] dispatching on the method name.
//!
//! [`did:key`]: https://w3c-ccg.github.io/did-method-key/
//! [`did:jwk`]: https://github.com/quartzjer/did-jwk/blob/main/spec.md
//! [`did:peer`]: https://identity.foundation/peer-did-method-spec/
//! [`did:web`]: https://w3c-ccg.github.io/did-method-web/
//!
//! # Examples
//!
//! ### Basic did:key resolution example.
//!
//! ```
//! use did_utils::methods::{DIDResolver, DidKey};
//! use did_utils::methods::DIDResolutionOptions;
//!
//! # async fn test_did_key() {
//!     let did_key_resolver = DidKey::new();
//!     let did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
//!     let output = did_key_resolver.resolve(did, &DIDResolutionOptions::default()).await;
//! # }
//! ```
//!
//! ### Resolving through the registry
//!
//! ```
//! use did_utils::methods::{DIDResolver, MethodRegistry, RetryOptions};
//! use did_utils::methods::DIDResolutionOptions;
//!
//! # async fn resolves_any_did() {
//!     let registry = MethodRegistry::with_default_methods(RetryOptions::new()).with_cache(true);
//!     let output = registry.resolve(
//!         "did:peer:0z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK",
//!         &DIDResolutionOptions::default()
//!     ).await;
//! # }
//! ```

mod common;
mod errors;
mod jwk;
mod key;
mod peer;
mod registry;
mod resolution;
mod traits;
mod utils;
mod web;

// Re-exported items
pub use errors::{DIDResolutionError, DidWebError, ParsingErrorSource};
pub use jwk::method::DidJwk;
pub use key::method::DidKey;
pub use peer::method::DidPeer;
pub use registry::MethodRegistry;
pub use resolution::*;
pub use traits::{DIDMethod, DIDResolver};
pub use utils::{did_method, parse_did_url, ParsedDIDUrl};
pub use web::{
    resolver::{parse_did_web_url, DidWeb},
    retry::{retry_async, RetryOptions},
};
