use std::fmt;

use super::errors::Error;
use crate::crypto::{sha256_hash, sha384_hash, Curve, KeyPair, P256KeyPair, P384KeyPair, Secp256k1KeyPair};

pub const CRYPTO_SUITE_EDDSA_JCS_2022: &str = "eddsa-jcs-2022";
pub const CRYPTO_SUITE_ECDSA_JCS_2019: &str = "ecdsa-jcs-2019";
pub const CRYPTO_SUITE_ECDSA_SECP256K1_JCS_2019: &str = "ecdsa-secp256k1-jcs-2019";

/// JCS cryptosuites, one per signing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suite {
    EdDsaJcs2022,
    EcdsaP256Jcs2019,
    EcdsaSecp256k1Jcs2019,
    EcdsaP384Jcs2019,
}

impl Suite {
    /// The suite signing with keys on the given curve.
    pub fn for_curve(curve: Curve) -> Self {
        match curve {
            Curve::Ed25519 => Suite::EdDsaJcs2022,
            Curve::P256 => Suite::EcdsaP256Jcs2019,
            Curve::Secp256k1 => Suite::EcdsaSecp256k1Jcs2019,
            Curve::P384 => Suite::EcdsaP384Jcs2019,
        }
    }

    /// Picks the suite for a key, checking a requested cryptosuite name against it.
    pub fn select(requested: Option<&str>, curve: Curve) -> Result<Self, Error> {
        let suite = Self::for_curve(curve);
        match requested {
            None => Ok(suite),
            Some(name) if name == suite.cryptosuite() => Ok(suite),
            Some(name) => Err(Error::UnsupportedSuite(format!("{name} cannot be used with a {curve} key"))),
        }
    }

    pub fn curve(&self) -> Curve {
        match self {
            Suite::EdDsaJcs2022 => Curve::Ed25519,
            Suite::EcdsaP256Jcs2019 => Curve::P256,
            Suite::EcdsaSecp256k1Jcs2019 => Curve::Secp256k1,
            Suite::EcdsaP384Jcs2019 => Curve::P384,
        }
    }

    /// Name carried in the `cryptosuite` member of proofs.
    pub fn cryptosuite(&self) -> &'static str {
        match self {
            Suite::EdDsaJcs2022 => CRYPTO_SUITE_EDDSA_JCS_2022,
            Suite::EcdsaP256Jcs2019 | Suite::EcdsaP384Jcs2019 => CRYPTO_SUITE_ECDSA_JCS_2019,
            Suite::EcdsaSecp256k1Jcs2019 => CRYPTO_SUITE_ECDSA_SECP256K1_JCS_2019,
        }
    }

    /// Digest applied to the canonical proof configuration and document.
    pub fn hash(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            Suite::EcdsaP384Jcs2019 => sha384_hash(payload),
            _ => sha256_hash(payload),
        }
    }

    pub fn signature_length(&self) -> usize {
        self.curve().signature_length()
    }

    /// Checks that raw signature bytes are a valid encoding for the suite.
    ///
    /// secp256k1 signatures are returned in low-S form.
    pub fn normalize_signature(&self, signature: &[u8]) -> Result<Vec<u8>, Error> {
        if signature.len() != self.signature_length() {
            return Err(Error::InvalidProofValue(format!(
                "expected a {}-byte signature for {}, got {} bytes",
                self.signature_length(),
                self,
                signature.len()
            )));
        }

        let normalized = match self {
            Suite::EdDsaJcs2022 => Ok(signature.to_vec()),
            Suite::EcdsaP256Jcs2019 => P256KeyPair::normalize_signature(signature),
            Suite::EcdsaSecp256k1Jcs2019 => Secp256k1KeyPair::normalize_signature(signature),
            Suite::EcdsaP384Jcs2019 => P384KeyPair::normalize_signature(signature),
        };
        normalized.map_err(|_| Error::InvalidProofValue(format!("signature is not a valid {} encoding", self.curve())))
    }

    /// Whether a proof's `cryptosuite` names this suite.
    pub fn matches(&self, cryptosuite: &str) -> bool {
        self.cryptosuite() == cryptosuite
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cryptosuite(), self.curve())
    }
}

impl From<&KeyPair> for Suite {
    fn from(key_pair: &KeyPair) -> Self {
        Suite::for_curve(key_pair.curve())
    }
}

/// Whether a cryptosuite name is known at all.
pub fn is_known_cryptosuite(name: &str) -> bool {
    matches!(
        name,
        CRYPTO_SUITE_EDDSA_JCS_2022 | CRYPTO_SUITE_ECDSA_JCS_2019 | CRYPTO_SUITE_ECDSA_SECP256K1_JCS_2019
    )
}
