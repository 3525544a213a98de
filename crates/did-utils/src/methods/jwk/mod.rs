//! The did:jwk method encodes a public JSON Web Key directly into the
//! identifier. Resolution decodes it back and wraps it in a single
//! verification method with the fragment `0`.
//!
//! See https://github.com/quartzjer/did-jwk/blob/main/spec.md

pub mod method;
pub mod resolver;
