use chrono::{SubsecRound, Utc};
use multibase::Base;
use serde_json::Value;
use tracing::debug;

use super::{
    errors::Error,
    model::{Proof, PROOF_TYPE_DATA_INTEGRITY_PROOF},
    suite::{is_known_cryptosuite, Suite},
    traits::CryptoProof,
};
use crate::{
    crypto::{CoreSign, KeyPair},
    ldmodel::ContextLoader,
};

/// Data Integrity proof over a JCS-canonicalized document, for any supported curve.
pub struct DataIntegrity<'a> {
    /// The proof object
    ///
    /// In a proof creation process, it does not contain the proof value, but
    ///   carries info like challenge, nonce, etc.
    ///
    /// In a proof verification process, it contains the proof as found in the
    ///   secured document, including the proof value
    pub proof: Proof,

    /// The keypair used to create the proof: in which case the signing key must be present.
    ///
    /// The keypair used to verify the proof: in which case only the public key must be present.
    ///
    /// This module does not perform resolution of the verification method. Callers
    /// extract the public key prior to calling this module.
    pub key_pair: KeyPair,

    /// Contexts the payload's `@context` must resolve against.
    pub contexts: &'a ContextLoader,
}

/// Digests whose concatenation is signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashData {
    pub proof_hash: Vec<u8>,
    pub document_hash: Vec<u8>,
}

impl HashData {
    pub fn signing_input(&self) -> Vec<u8> {
        [&self.proof_hash[..], &self.document_hash[..]].concat()
    }
}

impl<'a> DataIntegrity<'a> {
    pub fn new(proof: Proof, key_pair: KeyPair, contexts: &'a ContextLoader) -> Self {
        Self {
            proof,
            key_pair,
            contexts,
        }
    }

    /// The suite for the key, honoring a cryptosuite already set on the proof.
    pub fn suite(&self) -> Result<Suite, Error> {
        Suite::select(self.proof.cryptosuite.as_deref(), self.key_pair.curve())
    }
}

impl CryptoProof for DataIntegrity<'_> {
    fn proof(&self, payload: &Value) -> Result<Proof, Error> {
        let suite = self.suite()?;
        let proof = configure(&self.proof, suite);

        let signing_input = hash_data(suite, &proof, payload, self.contexts)?.signing_input();
        let signature = self.key_pair.sign(&signing_input)?;

        debug!("created {suite} proof for {}", proof.verification_method);

        Ok(Proof {
            proof_value: Some(encode_proof_value(&signature)),
            ..proof
        })
    }

    fn verify(&self, payload: &Value) -> Result<(), Error> {
        if self.proof.proof_type != PROOF_TYPE_DATA_INTEGRITY_PROOF {
            return Err(Error::MalformedProof(format!("unexpected proof type {}", self.proof.proof_type)));
        }

        let cryptosuite = self
            .proof
            .cryptosuite
            .as_deref()
            .ok_or_else(|| Error::MalformedProof("missing cryptosuite".to_string()))?;
        if !is_known_cryptosuite(cryptosuite) {
            return Err(Error::UnsupportedSuite(cryptosuite.to_string()));
        }
        let suite = Suite::select(Some(cryptosuite), self.key_pair.curve())?;

        let proof_value = self
            .proof
            .proof_value
            .as_deref()
            .ok_or_else(|| Error::InvalidProofValue("missing proofValue".to_string()))?;
        let signature = decode_proof_value(proof_value)?;
        if signature.len() != suite.signature_length() {
            return Err(Error::InvalidProofValue(format!(
                "expected a {}-byte signature, got {} bytes",
                suite.signature_length(),
                signature.len()
            )));
        }

        let signing_input = hash_data(suite, &self.proof, payload, self.contexts)?.signing_input();

        self.key_pair
            .verify(&signing_input, &signature)
            .map_err(|_| Error::InvalidSignature)
    }
}

/// Normalizes a proof configuration for the suite.
///
/// Sets the proof type and cryptosuite, drops any proof value and fills a
/// missing `created` with the current time truncated to seconds.
pub fn configure(proof: &Proof, suite: Suite) -> Proof {
    Proof {
        proof_type: PROOF_TYPE_DATA_INTEGRITY_PROOF.to_string(),
        cryptosuite: Some(suite.cryptosuite().to_string()),
        created: proof.created.or_else(|| Some(Utc::now().trunc_subsecs(0))),
        proof_value: None,
        ..proof.clone()
    }
}

/// JCS form of a document without its `proof` member.
///
/// Every context the document references must resolve.
pub fn canonicalize_document(document: &Value, contexts: &ContextLoader) -> Result<String, Error> {
    let object = document.as_object().ok_or(Error::InvalidDocument)?;

    if object.contains_key("@context") {
        contexts.resolve_document(document)?;
    }

    let mut unsecured = object.clone();
    unsecured.remove("proof");

    json_canon::to_string(&Value::Object(unsecured)).map_err(|err| Error::Canonicalization(err.to_string()))
}

/// JCS form of a proof configuration, i.e. the proof without its value.
pub fn canonicalize_proof(proof: &Proof) -> Result<String, Error> {
    json_canon::to_string(&proof.configuration()).map_err(|err| Error::Canonicalization(err.to_string()))
}

/// Hashes the canonical proof configuration and document with the suite's digest.
pub fn hash_data(suite: Suite, proof: &Proof, document: &Value, contexts: &ContextLoader) -> Result<HashData, Error> {
    let canon_proof = canonicalize_proof(proof)?;
    let canon_doc = canonicalize_document(document, contexts)?;

    Ok(HashData {
        proof_hash: suite.hash(canon_proof.as_bytes()),
        document_hash: suite.hash(canon_doc.as_bytes()),
    })
}

/// Multibase base58btc encoding of a signature.
pub fn encode_proof_value(signature: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, signature)
}

/// Decodes a `proofValue`, which must be base58btc multibase.
pub fn decode_proof_value(proof_value: &str) -> Result<Vec<u8>, Error> {
    match multibase::decode(proof_value) {
        Ok((Base::Base58Btc, bytes)) => Ok(bytes),
        Ok((base, _)) => Err(Error::InvalidProofValue(format!("expected base58btc, found {base:?}"))),
        Err(err) => Err(Error::InvalidProofValue(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::{Curve, Ed25519KeyPair, Generate, KeyMaterial},
        proof::model::{detach_proofs, embed_proof, Domain},
    };
    use chrono::TimeZone;
    use serde_json::json;

    fn credential() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "credentialSubject": {"id": "did:example:alice", "degree": "MSc"}
        })
    }

    fn proof_options(verification_method: &str) -> Proof {
        Proof {
            proof_purpose: Some("assertionMethod".to_string()),
            created: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..Proof::new(verification_method)
        }
    }

    // create a proof with a seeded Ed25519 key and check it against a known value.
    // The proof is then verified.
    #[test]
    fn test_create_verify_proof() {
        let seed = "Sample seed bytes of thirtytwo!b".as_bytes();
        let key_pair = KeyPair::Ed25519(Ed25519KeyPair::new_with_seed(seed).unwrap());
        let public_key = key_pair.public_key_bytes().unwrap();
        let contexts = ContextLoader::new();

        let proof = Proof {
            proof_purpose: Some("assertionMethod".to_string()),
            created: Some(Utc.with_ymd_and_hms(2023, 3, 5, 19, 23, 24).unwrap()),
            domain: Some(Domain::SingleString("vc-demo.adorsys.com".to_string())),
            challenge: Some("523452345234asfdasdfasdfa".to_string()),
            nonce: Some("1234567890".to_string()),
            ..Proof::new("https://di.example/issuer#z6MkjLrk3gKS2nnkeWcmcxiZPGskmesDpuwRBorgHxUXfxnG")
        };

        let payload = json!({
            "id": "did:example:123456789abcdefghi",
            "name": "Alice",
            "age": 101,
            "image": "data:image/png;base64,iVBORw0KGgo...kJggg==",
        });

        let prover = DataIntegrity::new(proof, key_pair, &contexts);
        let secured_proof = prover.proof(&payload).unwrap();

        let expected_canonicalized_proof = r#"{"challenge":"523452345234asfdasdfasdfa","created":"2023-03-05T19:23:24Z","cryptosuite":"eddsa-jcs-2022","domain":"vc-demo.adorsys.com","nonce":"1234567890","proofPurpose":"assertionMethod","proofValue":"z2DbDNkE47SquDQ7wM6p3RjNdFB1FG7Num2w9kprZjUB2gNZvz7bYgcT5XCe3TdjfxxWfKkup1ZdrRhfEMLsk2kmr","type":"DataIntegrityProof","verificationMethod":"https://di.example/issuer#z6MkjLrk3gKS2nnkeWcmcxiZPGskmesDpuwRBorgHxUXfxnG"}"#;
        assert_eq!(json_canon::to_string(&secured_proof).unwrap(), expected_canonicalized_proof);

        let mut secured_doc = payload.clone();
        embed_proof(&mut secured_doc, &secured_proof).unwrap();

        let verifier = DataIntegrity::new(
            secured_proof,
            KeyPair::from_public_key(Curve::Ed25519, &public_key).unwrap(),
            &contexts,
        );
        verifier.verify(&secured_doc).unwrap();
    }

    #[test]
    fn test_round_trip_on_every_curve() {
        let contexts = ContextLoader::new();

        for curve in Curve::ALL {
            let key_pair = KeyPair::generate(curve).unwrap();
            let prover = DataIntegrity::new(proof_options("did:example:issuer#key-1"), key_pair.clone(), &contexts);

            let proof = prover.proof(&credential()).unwrap();
            assert_eq!(proof.cryptosuite.as_deref(), Some(Suite::for_curve(curve).cryptosuite()));

            let signature = decode_proof_value(proof.proof_value.as_deref().unwrap()).unwrap();
            assert_eq!(signature.len(), curve.signature_length());

            let verifier = DataIntegrity::new(proof, key_pair.to_public(), &contexts);
            verifier.verify(&credential()).unwrap();
        }
    }

    #[test]
    fn test_signatures_are_deterministic() {
        let contexts = ContextLoader::new();

        for curve in Curve::ALL {
            let prover = DataIntegrity::new(
                proof_options("did:example:issuer#key-1"),
                KeyPair::generate(curve).unwrap(),
                &contexts,
            );
            assert_eq!(prover.proof(&credential()).unwrap(), prover.proof(&credential()).unwrap());
        }
    }

    #[test]
    fn test_tampering_invalidates_signature() {
        let contexts = ContextLoader::new();
        let key_pair = KeyPair::generate(Curve::P256).unwrap();
        let proof = DataIntegrity::new(proof_options("did:example:issuer#key-1"), key_pair.clone(), &contexts)
            .proof(&credential())
            .unwrap();

        let mut tampered = credential();
        tampered["credentialSubject"]["degree"] = json!("PhD");
        let verifier = DataIntegrity::new(proof.clone(), key_pair.to_public(), &contexts);
        assert_eq!(verifier.verify(&tampered).unwrap_err(), Error::InvalidSignature);

        let tampered_proof = Proof {
            challenge: Some("injected".to_string()),
            ..proof
        };
        let verifier = DataIntegrity::new(tampered_proof, key_pair.to_public(), &contexts);
        assert_eq!(verifier.verify(&credential()).unwrap_err(), Error::InvalidSignature);
    }

    #[test]
    fn test_proof_set_members_verify_independently() {
        let contexts = ContextLoader::new();
        let ed25519 = KeyPair::generate(Curve::Ed25519).unwrap();
        let p384 = KeyPair::generate(Curve::P384).unwrap();

        let mut document = credential();
        for key_pair in [&ed25519, &p384] {
            let (unsecured, _) = detach_proofs(&document).unwrap();
            let proof = DataIntegrity::new(proof_options("did:example:issuer#key"), key_pair.clone(), &contexts)
                .proof(&unsecured)
                .unwrap();
            embed_proof(&mut document, &proof).unwrap();
        }

        let (_, proofs) = detach_proofs(&document).unwrap();
        assert_eq!(proofs.len(), 2);
        for (proof, key_pair) in proofs.into_iter().zip([ed25519, p384]) {
            DataIntegrity::new(proof, key_pair, &contexts).verify(&document).unwrap();
        }
    }

    #[test]
    fn test_rejects_unresolvable_context() {
        let contexts = ContextLoader::new();
        let mut document = credential();
        document["@context"] = json!(["https://www.w3.org/ns/credentials/v2", "https://unknown.example/v1"]);

        let prover = DataIntegrity::new(
            proof_options("did:example:issuer#key-1"),
            KeyPair::generate(Curve::Ed25519).unwrap(),
            &contexts,
        );
        assert!(matches!(prover.proof(&document), Err(Error::Context(_))));
    }

    #[test]
    fn test_rejects_mismatched_or_malformed_proofs() {
        let contexts = ContextLoader::new();
        let key_pair = KeyPair::generate(Curve::Ed25519).unwrap();

        let prover = DataIntegrity::new(
            Proof {
                cryptosuite: Some("ecdsa-jcs-2019".to_string()),
                ..proof_options("did:example:issuer#key-1")
            },
            key_pair.clone(),
            &contexts,
        );
        assert!(matches!(prover.proof(&credential()), Err(Error::UnsupportedSuite(_))));

        let proof = DataIntegrity::new(proof_options("did:example:issuer#key-1"), key_pair.clone(), &contexts)
            .proof(&credential())
            .unwrap();

        let cases = [
            (
                Proof {
                    cryptosuite: Some("bbs-2023".to_string()),
                    ..proof.clone()
                },
                Error::UnsupportedSuite("bbs-2023".to_string()),
            ),
            (
                Proof {
                    proof_value: None,
                    ..proof.clone()
                },
                Error::InvalidProofValue("missing proofValue".to_string()),
            ),
            (
                Proof {
                    proof_value: Some(multibase::encode(Base::Base64Url, [1u8; 64])),
                    ..proof.clone()
                },
                Error::InvalidProofValue("expected base58btc, found Base64Url".to_string()),
            ),
            (
                Proof {
                    proof_value: Some(encode_proof_value(&[1u8; 32])),
                    ..proof.clone()
                },
                Error::InvalidProofValue("expected a 64-byte signature, got 32 bytes".to_string()),
            ),
        ];

        for (proof, expected) in cases {
            let verifier = DataIntegrity::new(proof, key_pair.to_public(), &contexts);
            assert_eq!(verifier.verify(&credential()).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_signing_needs_secret_key() {
        let contexts = ContextLoader::new();
        let key_pair = KeyPair::generate(Curve::Secp256k1).unwrap().to_public();

        let prover = DataIntegrity::new(proof_options("did:example:issuer#key-1"), key_pair, &contexts);
        assert_eq!(
            prover.proof(&credential()).unwrap_err(),
            Error::Crypto(crate::crypto::Error::MissingSecretKey)
        );
    }

    #[test]
    fn test_configure_defaults_created_to_whole_seconds() {
        let configured = configure(&Proof::new("did:example:issuer#key-1"), Suite::EdDsaJcs2022);
        let created = configured.created.unwrap();
        assert_eq!(created.timestamp_subsec_nanos(), 0);
        assert_eq!(configured.cryptosuite.as_deref(), Some("eddsa-jcs-2022"));
        assert_eq!(configured.proof_type, "DataIntegrityProof");
    }
}
