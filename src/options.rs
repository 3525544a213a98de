use chrono::{DateTime, Utc};
use did_utils::{
    didcore::VerificationRelationship,
    jwk::Jwk,
    proof::{Domain, Proof},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Checks a verifier can run on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Check {
    /// Cryptographic verification of the document's proofs.
    Proof,
    /// The credential's validity period covers the current time.
    Validity,
}

/// How a document is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofFormat {
    /// An embedded Data Integrity proof.
    #[default]
    Ldp,
    /// A compact JWS carrying the document as a `vc` or `vp` claim.
    Jwt,
}

/// Options of a single issuance, preparation or verification call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<VerificationRelationship>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<Check>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_format: Option<ProofFormat>,

    // Verifier-supplied key, used instead of resolving the verification method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

impl ProofOptions {
    /// Parses options from JSON. Blank input and `null` give the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let json = json.trim();
        if json.is_empty() || json == "null" {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|err| Error::new(ErrorKind::MalformedInput, err))
    }

    pub fn purpose_or(&self, default: VerificationRelationship) -> VerificationRelationship {
        self.proof_purpose.unwrap_or(default)
    }

    pub fn proof_format(&self) -> ProofFormat {
        self.proof_format.unwrap_or_default()
    }

    /// Requested checks, the proof check alone when none are given.
    pub fn checks(&self) -> Vec<Check> {
        match &self.checks {
            Some(checks) if !checks.is_empty() => checks.clone(),
            _ => vec![Check::Proof],
        }
    }

    /// Proof configuration carrying these options.
    pub fn to_proof(&self, verification_method: &str, purpose: VerificationRelationship) -> Proof {
        Proof {
            cryptosuite: self.cryptosuite.clone(),
            proof_purpose: Some(purpose.to_string()),
            created: self.created,
            expires: self.expires,
            domain: self.domain.clone().map(Domain::SingleString),
            challenge: self.challenge.clone(),
            nonce: self.nonce.clone(),
            ..Proof::new(verification_method)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_camel_case_options() {
        let options = ProofOptions::from_json(
            r#"{
                "proofPurpose": "authentication",
                "verificationMethod": "did:example:alice#key-1",
                "created": "2024-05-01T10:00:00Z",
                "challenge": "c0ae1c8e",
                "domain": "example.org",
                "checks": ["proof", "validity"]
            }"#,
        )
        .unwrap();

        assert_eq!(options.purpose_or(VerificationRelationship::AssertionMethod), VerificationRelationship::Authentication);
        assert_eq!(options.checks(), vec![Check::Proof, Check::Validity]);

        let proof = options.to_proof("did:example:alice#key-1", VerificationRelationship::Authentication);
        assert_eq!(
            serde_json::to_value(&proof).unwrap(),
            json!({
                "type": "DataIntegrityProof",
                "proofPurpose": "authentication",
                "verificationMethod": "did:example:alice#key-1",
                "created": "2024-05-01T10:00:00Z",
                "domain": "example.org",
                "challenge": "c0ae1c8e"
            })
        );
    }

    #[test]
    fn test_blank_options_are_defaults() {
        assert_eq!(ProofOptions::from_json("").unwrap(), ProofOptions::default());
        assert_eq!(ProofOptions::from_json(" null ").unwrap(), ProofOptions::default());
        assert_eq!(ProofOptions::default().checks(), vec![Check::Proof]);
    }

    #[test]
    fn test_proof_format() {
        assert_eq!(ProofOptions::default().proof_format(), ProofFormat::Ldp);

        let options = ProofOptions::from_json(r#"{"proofFormat": "jwt"}"#).unwrap();
        assert_eq!(options.proof_format(), ProofFormat::Jwt);

        let err = ProofOptions::from_json(r#"{"proofFormat": "cwt"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn test_rejects_unknown_purpose() {
        let err = ProofOptions::from_json(r#"{"proofPurpose": "signing"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
