//! The did:peer method, restricted to numalgo 0 (inception key without doc).
//!
//! See https://identity.foundation/peer-did-method-spec/#method-0-inception-key-without-doc

pub mod method;
pub mod resolver;
