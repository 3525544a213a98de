use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::Error;

pub const PROOF_TYPE_DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    // An optional identifier for the proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // A specified set of cryptographic primitives bundled together into a cryptographic suite
    // See https://www.w3.org/TR/vc-data-integrity/#dfn-proof-type
    #[serde(rename = "type")]
    pub proof_type: String,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-cryptosuite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-proof-purpose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    // See https://www.w3.org/TR/vc-data-integrity/#dfn-verification-method
    pub verification_method: String,

    // The date and time the proof was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    // The date and time that the proof expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    // One or more security domains in which the proof is meant to be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,

    // A string value that SHOULD be included in a proof if a domain is specified
    // The value is used once for a particular domain and window of time
    // This value is used to mitigate replay attacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    // Data necessary to verify the digital proof using the verificationMethod specified
    // The contents of the value MUST be a [MULTIBASE]-encoded binary value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    // Each value identifies another data integrity proof that
    // MUST verify before the current proof is processed
    // See https://www.w3.org/TR/vc-data-integrity/#proof-chains
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<PreviousProofs>,

    // A string value supplied by the proof creator that is unique to the proof
    // One use of this field is to increase privacy by decreasing linkability
    // that is the result of deterministically generated signatures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    // Members this model does not know, kept so they stay covered by the signature
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl Proof {
    /// Empty Data Integrity proof configuration for a verification method.
    pub fn new(verification_method: &str) -> Self {
        Self {
            id: None,
            proof_type: PROOF_TYPE_DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: None,
            proof_purpose: None,
            verification_method: verification_method.to_string(),
            created: None,
            expires: None,
            domain: None,
            challenge: None,
            proof_value: None,
            previous_proof: None,
            nonce: None,
            additional_properties: None,
        }
    }

    /// The proof configuration, i.e. this proof without its value.
    pub fn configuration(&self) -> Self {
        Self {
            proof_value: None,
            ..self.clone()
        }
    }

    /// Whether the domain of the proof matches the expected one.
    pub fn has_domain(&self, expected: &str) -> bool {
        match &self.domain {
            Some(Domain::SingleString(domain)) => domain == expected,
            Some(Domain::SetOfString(domains)) => domains.iter().any(|domain| domain == expected),
            None => false,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    SingleString(String),
    SetOfString(Vec<String>),
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PreviousProofs {
    SingleString(String),
    SetOfString(Vec<String>),
}

/// The `proof` member of a secured document: one proof or a proof set.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Proofs {
    SingleProof(Box<Proof>),
    SetOfProofs(Vec<Proof>),
}

impl Proofs {
    pub fn into_vec(self) -> Vec<Proof> {
        match self {
            Proofs::SingleProof(proof) => vec![*proof],
            Proofs::SetOfProofs(proofs) => proofs,
        }
    }
}

/// Separates a secured document into its unsecured content and its proofs.
pub fn detach_proofs(document: &Value) -> Result<(Value, Vec<Proof>), Error> {
    let mut content = document.as_object().cloned().ok_or(Error::InvalidDocument)?;

    let proofs = match content.remove("proof") {
        None => Vec::new(),
        Some(proof) => serde_json::from_value::<Proofs>(proof)
            .map_err(|err| Error::MalformedProof(err.to_string()))?
            .into_vec(),
    };

    Ok((Value::Object(content), proofs))
}

/// Adds a proof to a document.
///
/// An existing proof is never replaced: a single proof becomes a proof set.
pub fn embed_proof(document: &mut Value, proof: &Proof) -> Result<(), Error> {
    let object = document.as_object_mut().ok_or(Error::InvalidDocument)?;
    let proof = serde_json::to_value(proof).map_err(|err| Error::MalformedProof(err.to_string()))?;

    match object.remove("proof") {
        None => {
            object.insert("proof".to_string(), proof);
        }
        Some(Value::Array(mut proofs)) => {
            proofs.push(proof);
            object.insert("proof".to_string(), Value::Array(proofs));
        }
        Some(existing) => {
            object.insert("proof".to_string(), Value::Array(vec![existing, proof]));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proof_keeps_unknown_members() {
        let value = json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-jcs-2022",
            "verificationMethod": "did:example:123#key-1",
            "proofPurpose": "assertionMethod",
            "domain": ["a.example", "b.example"],
            "proofValue": "z3FXQ",
            "x-custom": {"answer": 42}
        });

        let proof: Proof = serde_json::from_value(value.clone()).unwrap();
        assert!(proof.has_domain("b.example"));
        assert!(!proof.has_domain("c.example"));
        assert_eq!(serde_json::to_value(&proof).unwrap(), value);

        let config = serde_json::to_value(proof.configuration()).unwrap();
        assert!(config.get("proofValue").is_none());
        assert_eq!(config["x-custom"]["answer"], 42);
    }

    #[test]
    fn test_embed_proof_builds_proof_sets() {
        let mut document = json!({"id": "urn:uuid:1"});
        let first = Proof::new("did:example:123#key-1");
        let second = Proof::new("did:example:123#key-2");

        embed_proof(&mut document, &first).unwrap();
        assert!(document["proof"].is_object());

        embed_proof(&mut document, &second).unwrap();
        embed_proof(&mut document, &second).unwrap();
        assert_eq!(document["proof"].as_array().unwrap().len(), 3);

        let (content, proofs) = detach_proofs(&document).unwrap();
        assert_eq!(content, json!({"id": "urn:uuid:1"}));
        assert_eq!(proofs, vec![first, second.clone(), second]);
    }

    #[test]
    fn test_detach_proofs_rejects_malformed_input() {
        assert_eq!(detach_proofs(&json!([1, 2])).unwrap_err(), Error::InvalidDocument);
        assert!(matches!(
            detach_proofs(&json!({"proof": {"type": 1}})).unwrap_err(),
            Error::MalformedProof(_)
        ));
    }
}
