//! Implementation of the DID Web method as defined in [the did:web method specification](https://w3c-ccg.github.io/did-method-web/).
//!
//! Documents are fetched over HTTPS, or HTTP for `localhost`, and transient
//! failures are retried with exponential backoff.

pub mod resolver;
pub mod retry;
