use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    crypto::{Algorithm, Error as CryptoError, KeyPair, PublicKeyFormat},
    didcore::{Document as DIDDocument, VerificationMethod},
    methods::{common::expand_multikey_did, errors::DIDResolutionError, key::method::DidKey, traits::DIDMethod},
};

lazy_static! {
    static ref DID_PEER_0_REGEX: Regex = Regex::new("^did:peer:(0(z)([1-9a-km-zA-HJ-NP-Z]+))$").unwrap();
}

/// did:peer method, numalgo 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidPeer {
    /// Key format to consider during DID expansion into a DID document
    key_format: PublicKeyFormat,
}

impl DIDMethod for DidPeer {
    fn name() -> String {
        "did:peer".to_string()
    }
}

impl DidPeer {
    /// Creates new instance of DidPeer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new instance of DidPeer with given key format.
    pub fn with_format(key_format: PublicKeyFormat) -> Self {
        Self { key_format }
    }

    /// Method 0: Generates did:peer address from inception key without doc
    ///
    /// See https://identity.foundation/peer-did-method-spec/#method-0-inception-key-without-doc
    pub fn create_did_peer_0_from_keypair(keypair: &KeyPair) -> String {
        DidKey::from_keypair(keypair).replacen("did:key:", "did:peer:0", 1)
    }

    /// Method 0: Generates did:peer address from raw public key bytes
    pub fn create_did_peer_0_from_raw_public_key(alg: Algorithm, bytes: &[u8]) -> Result<String, CryptoError> {
        let did_key = DidKey::from_raw_public_key(alg, bytes)?;
        Ok(did_key.replacen("did:key:", "did:peer:0", 1))
    }

    /// Verification method a key pair is published under in its did:peer:0 document.
    pub fn verification_method(&self, keypair: &KeyPair) -> Result<VerificationMethod, DIDResolutionError> {
        let did = Self::create_did_peer_0_from_keypair(keypair);
        self.expand(&did)?
            .verification_method
            .and_then(|methods| methods.into_iter().next())
            .ok_or(DIDResolutionError::InternalError)
    }

    /// Expands `did:peer` address into DID document
    pub fn expand(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        match did.strip_prefix("did:peer:") {
            Some(rest) if rest.starts_with('0') => self.expand_did_peer_0(did),
            Some(rest) if rest.starts_with(['1', '2', '3', '4']) => Err(DIDResolutionError::MethodNotSupported),
            _ => Err(DIDResolutionError::InvalidDid),
        }
    }

    /// Expands did:peer:0 address
    fn expand_did_peer_0(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        let multikey = DID_PEER_0_REGEX
            .captures(did)
            .and_then(|captures| captures.get(1))
            .and_then(|numalgo| numalgo.as_str().strip_prefix('0'))
            .ok_or(DIDResolutionError::InvalidDid)?;

        expand_multikey_did(did, multikey, self.key_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::ToMultikey, jwk::Jwk};
    use serde_json::Value;

    #[test]
    fn test_did_peer_0_generation_from_given_jwk() {
        let jwk: Jwk = serde_json::from_str(
            r#"{
                "kty": "OKP",
                "crv": "Ed25519",
                "x": "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"
            }"#,
        )
        .unwrap();
        let keypair: KeyPair = jwk.try_into().unwrap();

        let did = DidPeer::create_did_peer_0_from_keypair(&keypair);
        assert_eq!(did, "did:peer:0z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");
    }

    #[test]
    fn test_did_peer_0_generation_from_given_raw_public_key_bytes() {
        let entries = [
            (
                Algorithm::Ed25519,
                hex::decode("3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29").unwrap(),
                "did:peer:0z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp",
            ),
            (
                Algorithm::X25519,
                hex::decode("2fe57da347cd62431528daac5fbb290730fff684afc4cfc2ed90995f58cb3b74").unwrap(),
                "did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F",
            ),
        ];

        for (alg, bytes, expected) in entries {
            let did = DidPeer::create_did_peer_0_from_raw_public_key(alg, &bytes);
            assert_eq!(did.unwrap(), expected);
        }
    }

    #[test]
    fn test_expand_did_peer_0() {
        let did = "did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F";
        let expected: Value = serde_json::from_str(
            r##"{
                "@context": [
                    "https://www.w3.org/ns/did/v1",
                    "https://w3id.org/security/multikey/v1"
                ],
                "id": "did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F",
                "verificationMethod": [
                    {
                        "id": "did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F#z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F",
                        "type": "Multikey",
                        "controller": "did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F",
                        "publicKeyMultibase": "z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F"
                    }
                ],
                "keyAgreement": ["did:peer:0z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F#z6LSeu9HkTHSfLLeUs2nnzUSNedgDUevfNQgQjQC23ZCit6F"]
            }"##,
        )
        .unwrap();

        let diddoc = DidPeer::new().expand(did).unwrap();

        assert_eq!(
            json_canon::to_string(&diddoc).unwrap(),   //
            json_canon::to_string(&expected).unwrap(), //
        );
    }

    #[test]
    fn test_verification_method_matches_did_key_fragment() {
        let keypair = KeyPair::generate(crate::crypto::Curve::P384).unwrap();
        let did = DidPeer::create_did_peer_0_from_keypair(&keypair);

        let vm = DidPeer::new().verification_method(&keypair).unwrap();
        assert_eq!(vm.id, format!("{did}#{}", keypair.to_multikey()));
        assert_eq!(vm.controller, did);
    }

    #[test]
    fn test_expand_fails_on_unsupported_or_malformed_did_peer() {
        let did_method = DidPeer::new();

        let cases = [
            ("did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK", DIDResolutionError::InvalidDid),
            ("did:peer:0z6Mkhax0OIl", DIDResolutionError::InvalidDid),
            (
                "did:peer:2.Ez6LSbysY2xFMRpGMhb7tFTLMpeuPRaqaWM1yECx2AtzE3KCc.Vz6MkqRYqQiSgvZQdnBytw86Qbs2ZWUkGv22od935YF4s8M7V",
                DIDResolutionError::MethodNotSupported,
            ),
        ];

        for (did, expected) in cases {
            assert_eq!(did_method.expand(did).unwrap_err(), expected);
        }
    }
}
