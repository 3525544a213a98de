use base64ct::{Base64UrlUnpadded, Encoding};

use crate::{
    crypto::{KeyPair, PublicKeyFormat},
    didcore::{Document as DIDDocument, KeyFormat, VerificationMethod, VerificationMethodType},
    jwk::{Jwk, Key, OkpCurves},
    ldmodel::Context,
    methods::{common::DID_CONTEXT, errors::DIDResolutionError, traits::DIDMethod},
};

/// did:jwk method.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidJwk;

impl DIDMethod for DidJwk {
    fn name() -> String {
        "did:jwk".to_string()
    }
}

impl DidJwk {
    /// Creates new instance of DidJwk.
    pub fn new() -> Self {
        Self
    }

    /// Computes did:jwk address corresponding to a JWK.
    ///
    /// Private members are dropped and the remaining key is serialized
    /// with JCS before being base64url-encoded.
    pub fn from_jwk(jwk: &Jwk) -> Result<String, DIDResolutionError> {
        let canonical = json_canon::to_string(&jwk.to_public()).map_err(|_| DIDResolutionError::InternalError)?;
        Ok(format!("did:jwk:{}", Base64UrlUnpadded::encode_string(canonical.as_bytes())))
    }

    /// Computes did:jwk address corresponding to a key pair
    pub fn from_keypair(keypair: &KeyPair) -> Result<String, DIDResolutionError> {
        let jwk = keypair.to_jwk(false).map_err(|_| DIDResolutionError::InvalidPublicKey)?;
        Self::from_jwk(&jwk)
    }

    /// Verification method a key pair is published under in its did:jwk document.
    pub fn verification_method(&self, keypair: &KeyPair) -> Result<VerificationMethod, DIDResolutionError> {
        let did = Self::from_keypair(keypair)?;
        self.expand(&did)?
            .verification_method
            .and_then(|methods| methods.into_iter().next())
            .ok_or(DIDResolutionError::InternalError)
    }

    /// Decodes the JWK embedded in a did:jwk address.
    pub fn decode(did: &str) -> Result<Jwk, DIDResolutionError> {
        let encoded = did.strip_prefix("did:jwk:").ok_or(DIDResolutionError::InvalidDid)?;
        let bytes = Base64UrlUnpadded::decode_vec(encoded).map_err(|_| DIDResolutionError::InvalidDid)?;
        let jwk: Jwk = serde_json::from_slice(&bytes).map_err(|_| DIDResolutionError::InvalidDid)?;

        if jwk.is_private() {
            return Err(DIDResolutionError::InvalidDid);
        }

        match &jwk.key {
            Key::Okp(okp) if okp.crv == OkpCurves::X25519 => (),
            _ => {
                KeyPair::try_from(&jwk).map_err(|_| DIDResolutionError::InvalidPublicKey)?;
            }
        }

        Ok(jwk)
    }

    /// Expands did:jwk address into DID document
    ///
    /// See https://github.com/quartzjer/did-jwk/blob/main/spec.md#read
    pub fn expand(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        let jwk = Self::decode(did)?;

        let encryption_only = matches!(&jwk.key, Key::Okp(okp) if okp.crv == OkpCurves::X25519);
        let usage = jwk.prm.cls.clone();

        let vm = VerificationMethod::new(
            &format!("{did}#0"),
            PublicKeyFormat::Jwk.verification_method_type(),
            did,
            KeyFormat::Jwk(Box::new(jwk)),
        );
        let reference = || Some(vec![VerificationMethodType::Reference(vm.id.clone())]);

        let mut diddoc = DIDDocument::new(Context::from_urls(&[DID_CONTEXT, PublicKeyFormat::Jwk.context()]), did);

        if usage.as_deref() != Some("enc") && !encryption_only {
            diddoc.assertion_method = reference();
            diddoc.authentication = reference();
            diddoc.capability_invocation = reference();
            diddoc.capability_delegation = reference();
        }
        if usage.as_deref() != Some("sig") {
            diddoc.key_agreement = reference();
        }
        diddoc.verification_method = Some(vec![vm]);

        Ok(diddoc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;
    use serde_json::{json, Value};

    const P256_DID: &str = "did:jwk:eyJjcnYiOiJQLTI1NiIsImt0eSI6IkVDIiwieCI6ImFjYklRaXVNczNpOF91c3pFakoydHBUdFJNNEVVM3l6OTFQSDZDZEgyVjAiLCJ5IjoiX0tjeUxqOXZXTXB0bm1LdG00NkdxRHo4d2Y3NEk1TEtncmwyR3pIM25TRSJ9";

    #[test]
    fn test_did_jwk_generation_from_given_jwk() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "acbIQiuMs3i8_uszEjJ2tpTtRM4EU3yz91PH6CdH2V0",
            "y": "_KcyLj9vWMptnmKtm46GqDz8wf74I5LKgrl2GzH3nSE"
        }))
        .unwrap();

        assert_eq!(DidJwk::from_jwk(&jwk).unwrap(), P256_DID);
    }

    #[test]
    fn test_did_jwk_round_trip() {
        for curve in Curve::ALL {
            let keypair = KeyPair::generate(curve).unwrap();
            let did = DidJwk::from_keypair(&keypair).unwrap();

            let jwk = DidJwk::decode(&did).unwrap();
            assert_eq!(jwk, keypair.to_jwk(false).unwrap());

            let vm = DidJwk::new().verification_method(&keypair).unwrap();
            assert_eq!(vm.id, format!("{did}#0"));
            assert_eq!(vm.controller, did);
        }
    }

    #[test]
    fn test_expand_did_jwk() {
        let expected: Value = json!({
            "@context": [
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/suites/jws-2020/v1"
            ],
            "id": P256_DID,
            "verificationMethod": [{
                "id": format!("{P256_DID}#0"),
                "type": "JsonWebKey2020",
                "controller": P256_DID,
                "publicKeyJwk": {
                    "crv": "P-256",
                    "kty": "EC",
                    "x": "acbIQiuMs3i8_uszEjJ2tpTtRM4EU3yz91PH6CdH2V0",
                    "y": "_KcyLj9vWMptnmKtm46GqDz8wf74I5LKgrl2GzH3nSE"
                }
            }],
            "assertionMethod": [format!("{P256_DID}#0")],
            "authentication": [format!("{P256_DID}#0")],
            "capabilityInvocation": [format!("{P256_DID}#0")],
            "capabilityDelegation": [format!("{P256_DID}#0")],
            "keyAgreement": [format!("{P256_DID}#0")]
        });

        let diddoc = DidJwk::new().expand(P256_DID).unwrap();

        assert_eq!(
            json_canon::to_string(&diddoc).unwrap(),   //
            json_canon::to_string(&expected).unwrap(), //
        );
    }

    #[test]
    fn test_expand_did_jwk_honors_key_use() {
        let jwk: Jwk = serde_json::from_value(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "sig",
            "x": "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"
        }))
        .unwrap();
        let did = DidJwk::from_jwk(&jwk).unwrap();

        let diddoc = DidJwk::new().expand(&did).unwrap();
        assert!(diddoc.key_agreement.is_none());
        assert_eq!(diddoc.assertion_method.unwrap().len(), 1);
    }

    #[test]
    fn test_expand_fails_on_malformed_did_jwk() {
        let did_method = DidJwk::new();

        let cases = [
            ("did:key:eyJ9", DIDResolutionError::InvalidDid),
            ("did:jwk:!!!", DIDResolutionError::InvalidDid),
            ("did:jwk:eyJmb28iOiJiYXIifQ", DIDResolutionError::InvalidDid),
        ];
        for (did, expected) in cases {
            assert_eq!(did_method.expand(did).unwrap_err(), expected);
        }

        // Private keys must never be embedded in an identifier.
        let private = Base64UrlUnpadded::encode_string(
            br#"{"crv":"Ed25519","d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A","kty":"OKP","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#,
        );
        assert_eq!(
            did_method.expand(&format!("did:jwk:{private}")).unwrap_err(),
            DIDResolutionError::InvalidDid
        );
    }
}
