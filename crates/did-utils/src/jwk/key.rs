use serde::{Deserialize, Serialize};

use super::{ec::Ec, okp::Okp};

/// A key type that can be contained in a JWK.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", tag = "kty")]
pub enum Key {
    /// An elliptic-curve key.
    Ec(Ec),

    /// A CFRG-curve key.
    Okp(Okp),
}

impl Key {
    /// Whether the key carries private material.
    pub fn is_private(&self) -> bool {
        match self {
            Key::Ec(ec) => ec.d.is_some(),
            Key::Okp(okp) => okp.d.is_some(),
        }
    }

    /// Returns a copy of the key stripped of its private material.
    pub fn to_public(&self) -> Self {
        match self {
            Key::Ec(ec) => Key::Ec(Ec { d: None, ..ec.clone() }),
            Key::Okp(okp) => Key::Okp(Okp { d: None, ..okp.clone() }),
        }
    }
}

impl From<Ec> for Key {
    #[inline(always)]
    fn from(key: Ec) -> Self {
        Self::Ec(key)
    }
}

impl From<Okp> for Key {
    #[inline(always)]
    fn from(key: Okp) -> Self {
        Self::Okp(key)
    }
}
