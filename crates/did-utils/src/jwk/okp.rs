use serde::{Deserialize, Serialize};

use super::{bytes::Bytes, secret::Secret};

/// A CFRG-curve key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Okp {
    /// The CFRG curve.
    pub crv: OkpCurves,

    /// The public key.
    pub x: Bytes,

    /// The private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<Secret>,
}

/// The CFRG curve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OkpCurves {
    /// Ed25519 signature algorithm key pairs.
    Ed25519,

    /// X25519 function key pairs.
    X25519,
}
