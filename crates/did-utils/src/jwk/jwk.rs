use serde::{Deserialize, Serialize};

use super::{key::Key, prm::Parameters};

/// A JSON Web Key.
///
/// See `<https://www.rfc-editor.org/rfc/rfc7517>`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// The key material.
    #[serde(flatten)]
    pub key: Key,

    /// The key parameters.
    #[serde(flatten)]
    pub prm: Parameters,
}

impl Jwk {
    /// Whether the key carries private material.
    pub fn is_private(&self) -> bool {
        self.key.is_private()
    }

    /// Returns the public half of this key, keeping its parameters.
    pub fn to_public(&self) -> Self {
        Jwk {
            key: self.key.to_public(),
            prm: self.prm.clone(),
        }
    }
}

impl From<Key> for Jwk {
    fn from(key: Key) -> Self {
        Jwk {
            key,
            prm: Parameters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwk::{EcCurves, OkpCurves};

    #[test]
    fn test_deserialize_okp() {
        let jwk: Jwk = serde_json::from_str(
            r#"{
                "kty": "OKP",
                "crv": "Ed25519",
                "kid": "key-1",
                "x": "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"
            }"#,
        )
        .unwrap();

        assert!(matches!(&jwk.key, Key::Okp(okp) if okp.crv == OkpCurves::Ed25519 && okp.x.len() == 32));
        assert_eq!(jwk.prm.kid.as_deref(), Some("key-1"));
        assert!(!jwk.is_private());
    }

    #[test]
    fn test_deserialize_ec_and_strip_secret() {
        let jwk: Jwk = serde_json::from_str(
            r#"{
                "kty": "EC",
                "crv": "P-256",
                "x": "fyNYMN0976ci7xqiSdag3buk-ZCwgXU4kz9XNkBlNUI",
                "y": "hW2ojTNfH7Jbi8--CJUo3OCbH3y5n91g-IMA9MLMbTU",
                "d": "AQID"
            }"#,
        )
        .unwrap();

        assert!(matches!(&jwk.key, Key::Ec(ec) if ec.crv == EcCurves::P256));
        assert!(jwk.is_private());

        let public = serde_json::to_value(jwk.to_public()).unwrap();
        assert!(public.get("d").is_none());
        assert_eq!(public["kty"], "EC");
    }

    #[test]
    fn test_reject_unknown_key_type() {
        let result = serde_json::from_str::<Jwk>(r#"{"kty": "RSA", "n": "AQAB", "e": "AQAB"}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<Jwk>(r#"{"kty": "EC", "crv": "P-521", "x": "AQ", "y": "AQ"}"#);
        assert!(result.is_err());
    }
}
