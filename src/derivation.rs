//! Key generation and DID derivation.
//!
//! A DID and its verification method are pure functions of a method pattern
//! and a public key, so deriving them twice always yields the same output.

use std::{fmt, str::FromStr};

use did_utils::{
    crypto::{Curve, Error as CryptoError, KeyPair},
    didcore::{KeyFormat, VerificationMethod},
    jwk::Jwk,
    methods::{DidJwk, DidKey, DidPeer},
};
use multibase::Base;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// DID method patterns keys can be turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodPattern {
    Key,
    Jwk,
    Peer,
}

impl MethodPattern {
    pub const ALL: [MethodPattern; 3] = [MethodPattern::Key, MethodPattern::Jwk, MethodPattern::Peer];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodPattern::Key => "key",
            MethodPattern::Jwk => "jwk",
            MethodPattern::Peer => "peer",
        }
    }
}

impl fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "key" => Ok(MethodPattern::Key),
            "jwk" => Ok(MethodPattern::Jwk),
            "peer" => Ok(MethodPattern::Peer),
            other => Err(Error::msg(
                ErrorKind::UnsupportedMethod,
                format!("unsupported method pattern {other:?}, expected one of key, jwk, peer"),
            )),
        }
    }
}

/// Generates a fresh key on the named curve.
pub fn generate_key(curve: &str) -> Result<KeyPair> {
    let curve = Curve::from_str(curve)
        .map_err(|_| Error::msg(ErrorKind::KeyGeneration, format!("unknown curve {curve:?}")))?;

    debug!("generating {curve} key");
    KeyPair::generate(curve).map_err(|err| Error::new(ErrorKind::KeyGeneration, err))
}

/// Parses a JWK on one of the supported curves.
pub fn parse_jwk(json: &str) -> Result<KeyPair> {
    let jwk: Jwk = serde_json::from_str(json.trim()).map_err(|err| Error::new(ErrorKind::InvalidKey, err))?;
    key_from_jwk(&jwk)
}

pub fn key_from_jwk(jwk: &Jwk) -> Result<KeyPair> {
    KeyPair::try_from(jwk).map_err(|err| Error::new(ErrorKind::InvalidKey, err))
}

/// Serializes a key as a JWK, with its private part when asked.
pub fn key_to_jwk(key: &KeyPair, include_secret: bool) -> Result<Jwk> {
    key.to_jwk(include_secret).map_err(|err| Error::new(ErrorKind::InvalidKey, err))
}

/// Derives the DID of a key under a method pattern.
pub fn key_to_did(pattern: MethodPattern, key: &KeyPair) -> Result<String> {
    Ok(match pattern {
        MethodPattern::Key => DidKey::from_keypair(key),
        MethodPattern::Jwk => DidJwk::from_keypair(key).map_err(|err| Error::new(ErrorKind::InvalidKey, err))?,
        MethodPattern::Peer => DidPeer::create_did_peer_0_from_keypair(key),
    })
}

/// Derives the verification method a key is published under in the DID
/// document of [`key_to_did`].
pub fn key_to_verification_method(pattern: MethodPattern, key: &KeyPair) -> Result<VerificationMethod> {
    let vm = match pattern {
        MethodPattern::Key => DidKey::new().verification_method(key),
        MethodPattern::Jwk => DidJwk::new().verification_method(key),
        MethodPattern::Peer => DidPeer::new().verification_method(key),
    };
    vm.map_err(|err| Error::new(ErrorKind::InvalidKey, err))
}

/// Finds the verification method of `key` under whichever pattern derives `did`.
pub fn verification_method_for_did(did: &str, key: &KeyPair) -> Option<VerificationMethod> {
    MethodPattern::ALL.into_iter().find_map(|pattern| match key_to_did(pattern, key) {
        Ok(derived) if derived == did => key_to_verification_method(pattern, key).ok(),
        _ => None,
    })
}

/// Public key of a verification method.
///
/// Keys outside the four signing curves, such as X25519 agreement keys,
/// are reported as unsupported suites.
pub fn public_key_of(vm: &VerificationMethod) -> Result<KeyPair> {
    let key = match &vm.public_key {
        Some(KeyFormat::Multibase(multikey)) => KeyPair::from_multikey(multikey),
        Some(KeyFormat::Jwk(jwk)) => KeyPair::try_from(&jwk.to_public()),
        Some(KeyFormat::Base58(encoded)) => {
            let curve = match vm.key_type.as_str() {
                "Ed25519VerificationKey2018" | "Ed25519VerificationKey2020" => Curve::Ed25519,
                "EcdsaSecp256k1VerificationKey2019" => Curve::Secp256k1,
                other => {
                    return Err(Error::msg(
                        ErrorKind::UnsupportedSuite,
                        format!("publicKeyBase58 is not supported for {other}"),
                    ))
                }
            };
            let bytes = Base::Base58Btc
                .decode(encoded)
                .map_err(|err| Error::new(ErrorKind::InvalidKey, err))?;
            KeyPair::from_public_key(curve, &bytes)
        }
        None => {
            return Err(Error::msg(
                ErrorKind::InvalidKey,
                format!("verification method {} has no public key", vm.id),
            ))
        }
    };

    key.map(|key| key.to_public()).map_err(|err| match err {
        CryptoError::InvalidCurve => Error::new(ErrorKind::UnsupportedSuite, err),
        _ => Error::new(ErrorKind::InvalidKey, err),
    })
}

/// Reads a public key descriptor: either a bare JWK or a verification method
/// carrying `publicKeyJwk` or `publicKeyMultibase`.
///
/// Returns the public key and, for verification methods, their id.
pub fn parse_key_descriptor(descriptor: &Value) -> Result<(KeyPair, Option<String>)> {
    if descriptor.get("kty").is_some() {
        let jwk: Jwk = serde_json::from_value(descriptor.clone()).map_err(|err| Error::new(ErrorKind::InvalidKey, err))?;
        return Ok((key_from_jwk(&jwk)?.to_public(), None));
    }

    let vm: VerificationMethod =
        serde_json::from_value(descriptor.clone()).map_err(|err| Error::new(ErrorKind::InvalidKey, err))?;
    Ok((public_key_of(&vm)?, Some(vm.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ED25519_JWK: &str = r#"{
        "kty": "OKP",
        "crv": "Ed25519",
        "x": "ebVWLo_mVPlAeLES6KmLp5AfhTrmlb7X4OORC60ElmQ",
        "d": "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyA"
    }"#;

    #[test]
    fn test_generate_key_accepts_aliases() {
        for (name, curve) in [
            ("Ed25519", Curve::Ed25519),
            ("P-256", Curve::P256),
            ("P256", Curve::P256),
            ("secp256k1", Curve::Secp256k1),
            ("K-256", Curve::Secp256k1),
            ("P-384", Curve::P384),
            ("P384", Curve::P384),
        ] {
            let key = generate_key(name).unwrap();
            assert_eq!(key.curve(), curve);
            assert!(key.has_secret());
        }
    }

    #[test]
    fn test_generate_key_rejects_unknown_curve() {
        let err = generate_key("P-521").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyGeneration);
    }

    #[test]
    fn test_method_patterns() {
        for pattern in MethodPattern::ALL {
            assert_eq!(pattern.as_str().parse::<MethodPattern>().unwrap(), pattern);
        }
        for unsupported in ["web", "did:key", "KEY", ""] {
            let err = unsupported.parse::<MethodPattern>().unwrap_err();
            assert_eq!(err.code(), 3);
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let key = parse_jwk(ED25519_JWK).unwrap();

        for pattern in MethodPattern::ALL {
            let did = key_to_did(pattern, &key).unwrap();
            assert_eq!(did, key_to_did(pattern, &key).unwrap());

            let vm = key_to_verification_method(pattern, &key).unwrap();
            assert_eq!(vm, key_to_verification_method(pattern, &key).unwrap());
            assert_eq!(vm.controller, did);
            assert!(vm.id.starts_with(&format!("{did}#")));
        }
    }

    #[test]
    fn test_did_key_and_peer_share_multibase() {
        let key = parse_jwk(ED25519_JWK).unwrap();

        let did_key = key_to_did(MethodPattern::Key, &key).unwrap();
        let did_peer = key_to_did(MethodPattern::Peer, &key).unwrap();

        assert!(did_key.starts_with("did:key:z6Mk"));
        assert_eq!(did_peer, format!("did:peer:0{}", did_key.trim_start_matches("did:key:")));
        assert!(key_to_verification_method(MethodPattern::Jwk, &key).unwrap().id.ends_with("#0"));
    }

    #[test]
    fn test_parse_jwk_rejects_unknown_curve() {
        let err = parse_jwk(r#"{"kty": "OKP", "crv": "X25519", "x": "hSDwCYkwp1R0i33ctD73Wg2_Og0mOBr066SpjqqbTmo"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);

        let err = parse_jwk("not a key").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
    }

    #[test]
    fn test_verification_method_for_did() {
        let key = generate_key("P-256").unwrap();
        let did = key_to_did(MethodPattern::Jwk, &key).unwrap();

        let vm = verification_method_for_did(&did, &key).unwrap();
        assert_eq!(vm.id, format!("{did}#0"));

        let other = generate_key("P-256").unwrap();
        assert!(verification_method_for_did(&did, &other).is_none());
    }

    #[test]
    fn test_parse_key_descriptor() {
        let key = parse_jwk(ED25519_JWK).unwrap();
        let vm = key_to_verification_method(MethodPattern::Key, &key).unwrap();

        let (public, id) = parse_key_descriptor(&serde_json::to_value(&vm).unwrap()).unwrap();
        assert!(!public.has_secret());
        assert!(public.same_public_key(&key));
        assert_eq!(id, Some(vm.id));

        let jwk = serde_json::to_value(key_to_jwk(&key, true).unwrap()).unwrap();
        let (public, id) = parse_key_descriptor(&jwk).unwrap();
        assert!(!public.has_secret());
        assert_eq!(id, None);
    }

    #[test]
    fn test_public_key_of_base58_method() {
        let vm: VerificationMethod = serde_json::from_value(json!({
            "id": "did:example:issuer#key-1",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:example:issuer",
            "publicKeyBase58": "7dNyxjs9BUfsbX11VG4BGDMB3Wg1Pq2NqhSwTBT8UuRC"
        }))
        .unwrap();

        let key = public_key_of(&vm).unwrap();
        assert_eq!(key.curve(), Curve::Ed25519);
    }

    #[test]
    fn test_public_key_of_agreement_key_is_unsupported() {
        let vm: VerificationMethod = serde_json::from_value(json!({
            "id": "did:example:holder#key-x25519",
            "type": "Multikey",
            "controller": "did:example:holder",
            "publicKeyMultibase": "z6LSj72tK8brWgZja8NLRwPigth2T9QRiG1uH9oKZuKjdh9p"
        }))
        .unwrap();

        assert_eq!(public_key_of(&vm).unwrap_err().kind(), ErrorKind::UnsupportedSuite);
    }
}
