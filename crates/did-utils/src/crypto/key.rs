use std::{fmt, str::FromStr};

use super::{
    alg::{decode_multikey, Algorithm},
    ecdsa::{P256KeyPair, P384KeyPair, Secp256k1KeyPair},
    ed25519::Ed25519KeyPair,
    errors::Error,
    traits::{CoreSign, Generate, KeyMaterial, ToMultikey},
};
use crate::jwk::{Bytes, Ec, EcCurves, Jwk, Key, Okp, OkpCurves, Secret};

/// Signing curves supported across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    Ed25519,
    P256,
    Secp256k1,
    P384,
}

impl Curve {
    pub const ALL: [Curve; 4] = [Curve::Ed25519, Curve::P256, Curve::Secp256k1, Curve::P384];

    /// Multicodec algorithm of the curve's public keys.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Curve::Ed25519 => Algorithm::Ed25519,
            Curve::P256 => Algorithm::P256,
            Curve::Secp256k1 => Algorithm::Secp256k1,
            Curve::P384 => Algorithm::P384,
        }
    }

    /// Size in bytes of a raw signature produced with the curve.
    pub fn signature_length(&self) -> usize {
        match self {
            Curve::Ed25519 | Curve::P256 | Curve::Secp256k1 => 64,
            Curve::P384 => 96,
        }
    }

    pub fn from_algorithm(alg: Algorithm) -> Option<Self> {
        match alg {
            Algorithm::Ed25519 => Some(Curve::Ed25519),
            Algorithm::P256 => Some(Curve::P256),
            Algorithm::Secp256k1 => Some(Curve::Secp256k1),
            Algorithm::P384 => Some(Curve::P384),
            Algorithm::X25519 => None,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Curve::Ed25519 => "Ed25519",
            Curve::P256 => "P-256",
            Curve::Secp256k1 => "secp256k1",
            Curve::P384 => "P-384",
        };
        f.write_str(name)
    }
}

impl FromStr for Curve {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519" | "ed25519" => Ok(Curve::Ed25519),
            "P-256" | "P256" | "p256" | "secp256r1" => Ok(Curve::P256),
            "secp256k1" | "K-256" | "k256" => Ok(Curve::Secp256k1),
            "P-384" | "P384" | "p384" | "secp384r1" => Ok(Curve::P384),
            _ => Err(Error::InvalidCurve),
        }
    }
}

/// Key pair on any of the supported signing curves.
///
/// The secret half is optional, so the same type carries verification keys
/// resolved from DID documents and signing keys supplied by callers.
#[derive(Debug, Clone)]
pub enum KeyPair {
    Ed25519(Ed25519KeyPair),
    P256(P256KeyPair),
    Secp256k1(Secp256k1KeyPair),
    P384(P384KeyPair),
}

impl KeyPair {
    /// Generates a fresh random key pair on the given curve.
    pub fn generate(curve: Curve) -> Result<Self, Error> {
        Ok(match curve {
            Curve::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::new()?),
            Curve::P256 => KeyPair::P256(P256KeyPair::new()?),
            Curve::Secp256k1 => KeyPair::Secp256k1(Secp256k1KeyPair::new()?),
            Curve::P384 => KeyPair::P384(P384KeyPair::new()?),
        })
    }

    /// Deterministically derives a key pair from a seed of the curve's scalar size.
    pub fn from_seed(curve: Curve, seed: &[u8]) -> Result<Self, Error> {
        if seed.is_empty() {
            return Err(Error::InvalidSeed);
        }
        Ok(match curve {
            Curve::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::new_with_seed(seed)?),
            Curve::P256 => KeyPair::P256(P256KeyPair::new_with_seed(seed)?),
            Curve::Secp256k1 => KeyPair::Secp256k1(Secp256k1KeyPair::new_with_seed(seed)?),
            Curve::P384 => KeyPair::P384(P384KeyPair::new_with_seed(seed)?),
        })
    }

    /// Builds a public-only key pair from the curve's public key encoding.
    pub fn from_public_key(curve: Curve, public_key: &[u8]) -> Result<Self, Error> {
        Ok(match curve {
            Curve::Ed25519 => KeyPair::Ed25519(Ed25519KeyPair::from_public_key(public_key)?),
            Curve::P256 => KeyPair::P256(P256KeyPair::from_public_key(public_key)?),
            Curve::Secp256k1 => KeyPair::Secp256k1(Secp256k1KeyPair::from_public_key(public_key)?),
            Curve::P384 => KeyPair::P384(P384KeyPair::from_public_key(public_key)?),
        })
    }

    /// Decodes a public-only key pair from a multikey string.
    pub fn from_multikey(multikey: &str) -> Result<Self, Error> {
        let (alg, bytes) = decode_multikey(multikey).map_err(|_| Error::InvalidPublicKey)?;
        let curve = Curve::from_algorithm(alg).ok_or(Error::InvalidCurve)?;
        Self::from_public_key(curve, &bytes)
    }

    pub fn curve(&self) -> Curve {
        match self {
            KeyPair::Ed25519(_) => Curve::Ed25519,
            KeyPair::P256(_) => Curve::P256,
            KeyPair::Secp256k1(_) => Curve::Secp256k1,
            KeyPair::P384(_) => Curve::P384,
        }
    }

    pub fn has_secret(&self) -> bool {
        match self {
            KeyPair::Ed25519(kp) => kp.secret_key.is_some(),
            KeyPair::P256(kp) => kp.secret_key.is_some(),
            KeyPair::Secp256k1(kp) => kp.secret_key.is_some(),
            KeyPair::P384(kp) => kp.secret_key.is_some(),
        }
    }

    /// Returns a copy of this key pair without its secret half.
    pub fn to_public(&self) -> Self {
        match self {
            KeyPair::Ed25519(kp) => KeyPair::Ed25519(Ed25519KeyPair {
                public_key: kp.public_key,
                secret_key: None,
            }),
            KeyPair::P256(kp) => KeyPair::P256(P256KeyPair {
                public_key: kp.public_key.clone(),
                secret_key: None,
            }),
            KeyPair::Secp256k1(kp) => KeyPair::Secp256k1(Secp256k1KeyPair {
                public_key: kp.public_key.clone(),
                secret_key: None,
            }),
            KeyPair::P384(kp) => KeyPair::P384(P384KeyPair {
                public_key: kp.public_key.clone(),
                secret_key: None,
            }),
        }
    }

    /// Whether both key pairs hold the same public key.
    pub fn same_public_key(&self, other: &KeyPair) -> bool {
        self.curve() == other.curve() && self.public_key_bytes().ok() == other.public_key_bytes().ok()
    }

    /// Serializes the key as a JWK, including the private part when asked and available.
    pub fn to_jwk(&self, include_secret: bool) -> Result<Jwk, Error> {
        let secret = if include_secret && self.has_secret() {
            Some(Secret::from(self.private_key_bytes()?))
        } else {
            None
        };

        let key = match self {
            KeyPair::Ed25519(kp) => Key::Okp(Okp {
                crv: OkpCurves::Ed25519,
                x: Bytes::from(kp.public_key_bytes()?),
                d: secret,
            }),
            KeyPair::P256(kp) => ec_key(EcCurves::P256, kp.coordinates(), secret),
            KeyPair::Secp256k1(kp) => ec_key(EcCurves::P256K, kp.coordinates(), secret),
            KeyPair::P384(kp) => ec_key(EcCurves::P384, kp.coordinates(), secret),
        };

        Ok(Jwk::from(key))
    }

    /// Brings an ECDSA signature into the canonical form expected by verifiers.
    ///
    /// For secp256k1 this flips high-S signatures to their low-S twin.
    pub fn normalize_signature(&self, signature: &[u8]) -> Result<Vec<u8>, Error> {
        if signature.len() != self.curve().signature_length() {
            return Err(Error::CanNotRetrieveSignature);
        }
        match self {
            KeyPair::Ed25519(_) => Ok(signature.to_vec()),
            KeyPair::P256(_) => P256KeyPair::normalize_signature(signature),
            KeyPair::Secp256k1(_) => Secp256k1KeyPair::normalize_signature(signature),
            KeyPair::P384(_) => P384KeyPair::normalize_signature(signature),
        }
    }
}

fn ec_key(crv: EcCurves, (x, y): (Vec<u8>, Vec<u8>), d: Option<Secret>) -> Key {
    Key::Ec(Ec {
        crv,
        x: Bytes::from(x),
        y: Bytes::from(y),
        d,
    })
}

impl KeyMaterial for KeyPair {
    fn public_key_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            KeyPair::Ed25519(kp) => kp.public_key_bytes(),
            KeyPair::P256(kp) => kp.public_key_bytes(),
            KeyPair::Secp256k1(kp) => kp.public_key_bytes(),
            KeyPair::P384(kp) => kp.public_key_bytes(),
        }
    }

    fn private_key_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            KeyPair::Ed25519(kp) => kp.private_key_bytes(),
            KeyPair::P256(kp) => kp.private_key_bytes(),
            KeyPair::Secp256k1(kp) => kp.private_key_bytes(),
            KeyPair::P384(kp) => kp.private_key_bytes(),
        }
    }
}

impl CoreSign for KeyPair {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            KeyPair::Ed25519(kp) => kp.sign(payload),
            KeyPair::P256(kp) => kp.sign(payload),
            KeyPair::Secp256k1(kp) => kp.sign(payload),
            KeyPair::P384(kp) => kp.sign(payload),
        }
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), Error> {
        match self {
            KeyPair::Ed25519(kp) => kp.verify(payload, signature),
            KeyPair::P256(kp) => kp.verify(payload, signature),
            KeyPair::Secp256k1(kp) => kp.verify(payload, signature),
            KeyPair::P384(kp) => kp.verify(payload, signature),
        }
    }
}

impl ToMultikey for KeyPair {
    fn to_multikey(&self) -> String {
        match self {
            KeyPair::Ed25519(kp) => kp.to_multikey(),
            KeyPair::P256(kp) => kp.to_multikey(),
            KeyPair::Secp256k1(kp) => kp.to_multikey(),
            KeyPair::P384(kp) => kp.to_multikey(),
        }
    }
}

impl TryFrom<&Jwk> for KeyPair {
    type Error = Error;

    /// Parses a JWK into a key pair.
    ///
    /// When the JWK carries a private part, the public part it advertises
    /// must match the one derived from the secret.
    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        let keypair = match &jwk.key {
            Key::Okp(okp) => {
                if okp.crv != OkpCurves::Ed25519 {
                    return Err(Error::InvalidCurve);
                }
                let public = KeyPair::Ed25519(Ed25519KeyPair::from_public_key(&okp.x)?);
                match &okp.d {
                    Some(d) => (public, Some(KeyPair::Ed25519(Ed25519KeyPair::from_secret_key(d.as_bytes())?))),
                    None => (public, None),
                }
            }
            Key::Ec(ec) => {
                let (public, private) = match ec.crv {
                    EcCurves::P256 => (
                        KeyPair::P256(P256KeyPair::from_coordinates(&ec.x, &ec.y)?),
                        ec.d.as_ref().map(|d| P256KeyPair::from_secret_key(d.as_bytes()).map(KeyPair::P256)),
                    ),
                    EcCurves::P256K => (
                        KeyPair::Secp256k1(Secp256k1KeyPair::from_coordinates(&ec.x, &ec.y)?),
                        ec.d.as_ref()
                            .map(|d| Secp256k1KeyPair::from_secret_key(d.as_bytes()).map(KeyPair::Secp256k1)),
                    ),
                    EcCurves::P384 => (
                        KeyPair::P384(P384KeyPair::from_coordinates(&ec.x, &ec.y)?),
                        ec.d.as_ref().map(|d| P384KeyPair::from_secret_key(d.as_bytes()).map(KeyPair::P384)),
                    ),
                };
                (public, private.transpose()?)
            }
        };

        match keypair {
            (public, None) => Ok(public),
            (public, Some(private)) if private.same_public_key(&public) => Ok(private),
            _ => Err(Error::InvalidPublicKey),
        }
    }
}

impl TryFrom<Jwk> for KeyPair {
    type Error = Error;

    fn try_from(jwk: Jwk) -> Result<Self, Self::Error> {
        KeyPair::try_from(&jwk)
    }
}
