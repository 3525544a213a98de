//! This module provides utilities for working with [Verifiable Credentials (VCs)][vc].
//!
//! Both the [1.1] and [2.0] data models are accepted: `issuanceDate` and
//! `expirationDate` are read as aliases of `validFrom` and `validUntil`.
//!
//! [vc]: https://www.w3.org/TR/vc-data-model-2.0/
//! [1.1]: https://www.w3.org/TR/vc-data-model/
//! [2.0]: https://www.w3.org/TR/vc-data-model-2.0/

mod errors;
mod model;

// Re-export
pub use errors::Error;
pub use model::*;
