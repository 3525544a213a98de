use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::errors::Error;
use crate::{ldmodel::Context, proof::Proofs};

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2_CONTEXT: &str = "https://www.w3.org/ns/credentials/v2";

pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Represents a Verifiable Credential.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Context,

    // Identifier of this credential.
    // WARNING: This is not the identifier of the subject of the credential.
    // WARNING: This is not the identifier of the holder of the credential.
    // https://www.w3.org/TR/vc-data-model-2.0/#identifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // see https://www.w3.org/TR/vc-data-model-2.0/#types
    #[serde(rename = "type")]
    pub cred_type: OneOrMany<String>,

    // see https://www.w3.org/TR/vc-data-model-2.0/#issuer
    pub issuer: Issuer,

    // Data model 1.1 validity dates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    // Data model 2.0 validity dates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    // See https://www.w3.org/TR/vc-data-model-2.0/#credential-subject
    pub credential_subject: OneOrMany<CredentialSubject>,

    // Set of proofs
    // We allow a vc to be created without the proof block,
    // as we want to produce the unsecured version before
    // proof production or proof verification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proofs>,

    // === Properties Map===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// Represents a Verifiable Presentation.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    #[serde(rename = "@context")]
    pub context: Context,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // see https://www.w3.org/TR/vc-data-model-2.0/#types
    #[serde(rename = "type")]
    pub pres_type: OneOrMany<String>,

    // Identifies the presenter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<Issuer>,

    // Embedded credentials are kept as raw JSON so their proofs stay verifiable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<OneOrMany<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proofs>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
// `Many` comes first so that a JSON array is never taken for a single `Value`.
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(item) => std::slice::from_ref(item).iter(),
            OneOrMany::Many(items) => items.iter(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, OneOrMany::Many(items) if items.is_empty())
    }
}

impl OneOrMany<String> {
    pub fn contains(&self, value: &str) -> bool {
        self.iter().any(|item| item == value)
    }
}

/// An issuer or holder: a URI, or an object carrying one as `id`.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Issuer {
    SingleString(String),
    IssuerObject(IssuerObject),
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Issuer::SingleString(id) => id,
            Issuer::IssuerObject(object) => &object.id,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
pub struct IssuerObject {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    // Identifies the subject of the verifiable credential
    // (the thing the claims are about)
    // see https://www.w3.org/TR/vc-data-model-2.0/#identifiers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // === Properties Map===
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl VerifiableCredential {
    /// Parses and structurally validates a credential.
    pub fn from_value(document: &Value) -> Result<Self, Error> {
        let credential: Self = parse(document, "credential")?;
        credential.validate()?;
        Ok(credential)
    }

    /// Checks the members every credential must carry.
    pub fn validate(&self) -> Result<(), Error> {
        check_base_context(&self.context)?;

        if !self.cred_type.contains(VERIFIABLE_CREDENTIAL_TYPE) {
            return Err(Error::Malformed(format!("type must include {VERIFIABLE_CREDENTIAL_TYPE}")));
        }

        check_uri("issuer", self.issuer.id())?;

        if self.credential_subject.is_empty() {
            return Err(Error::Malformed("credentialSubject must not be empty".to_string()));
        }

        if let (Some(from), Some(until)) = (self.valid_from(), self.valid_until()) {
            if from > until {
                return Err(Error::Malformed("validity period ends before it starts".to_string()));
            }
        }

        Ok(())
    }

    /// Start of the validity period, `validFrom` taking precedence over `issuanceDate`.
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_from.or(self.issuance_date)
    }

    /// End of the validity period, `validUntil` taking precedence over `expirationDate`.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until.or(self.expiration_date)
    }

    /// Checks that `now` falls inside the credential's validity period.
    pub fn check_validity_period(&self, now: DateTime<Utc>) -> Result<(), Error> {
        match (self.valid_from(), self.valid_until()) {
            (Some(from), _) if now < from => Err(Error::NotYetValid(from)),
            (_, Some(until)) if now > until => Err(Error::Expired(until)),
            _ => Ok(()),
        }
    }
}

impl VerifiablePresentation {
    /// Parses and structurally validates a presentation.
    pub fn from_value(document: &Value) -> Result<Self, Error> {
        let presentation: Self = parse(document, "presentation")?;
        presentation.validate()?;
        Ok(presentation)
    }

    pub fn validate(&self) -> Result<(), Error> {
        check_base_context(&self.context)?;

        if !self.pres_type.contains(VERIFIABLE_PRESENTATION_TYPE) {
            return Err(Error::Malformed(format!("type must include {VERIFIABLE_PRESENTATION_TYPE}")));
        }

        if let Some(holder) = &self.holder {
            check_uri("holder", holder.id())?;
        }

        for (index, credential) in self.credentials().enumerate() {
            match credential {
                Value::Object(_) => {
                    VerifiableCredential::from_value(credential)
                        .map_err(|err| Error::Malformed(format!("verifiableCredential[{index}]: {err}")))?;
                }
                // Enveloped credentials are opaque here.
                Value::String(_) => {}
                _ => {
                    return Err(Error::Malformed(format!(
                        "verifiableCredential[{index}] must be an object or a string"
                    )))
                }
            }
        }

        Ok(())
    }

    /// Embedded credentials, in document order.
    pub fn credentials(&self) -> impl Iterator<Item = &Value> {
        self.verifiable_credential.iter().flat_map(|credentials| credentials.iter())
    }
}

fn parse<T: serde::de::DeserializeOwned>(document: &Value, what: &str) -> Result<T, Error> {
    if !document.is_object() {
        return Err(Error::Malformed(format!("{what} must be a JSON object")));
    }
    serde_json::from_value(document.clone()).map_err(|err| Error::Malformed(format!("invalid {what}: {err}")))
}

fn check_base_context(context: &Context) -> Result<(), Error> {
    match context.first_url() {
        Some(CREDENTIALS_V1_CONTEXT | CREDENTIALS_V2_CONTEXT) => Ok(()),
        _ => Err(Error::Malformed(format!(
            "first @context entry must be {CREDENTIALS_V1_CONTEXT} or {CREDENTIALS_V2_CONTEXT}"
        ))),
    }
}

fn check_uri(member: &str, value: &str) -> Result<(), Error> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|_| Error::Malformed(format!("{member} must be a URI, got {value:?}")))
}

// testing
#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        crypto::{Curve, KeyPair},
        ldmodel::ContextLoader,
        proof::{detach_proofs, CryptoProof, DataIntegrity},
    };

    const SECURED_VC: &str = r#"{"@context":["https://www.w3.org/ns/credentials/v2","https://www.w3.org/ns/credentials/examples/v2"],"credentialSubject":{"alumniOf":{"id":"did:key#z38w6kKWT7hesyxuuVUSH4LsxbcRof4ra1QBDtR1qrc1q","name":"Example University"},"id":"did:key#z38w6kKWT7hesyxuuVUSH4LsxbcRof4ra1QBDtR1qrc1q"},"description":"Graduated from Example University","id":"http://university.example/credentials/3732","issuer":"did:key#z7dNyxjs9BUfsbX11VG4BGDMB3Wg1Pq2NqhSwTBT8UuRC","name":"Jayden Doe","proof":{"challenge":"523452345234asfdasdfasdfa","created":"2023-03-05T19:23:24Z","cryptosuite":"eddsa-jcs-2022","domain":"vc-demo.adorsys.com","nonce":"1234567890","proofPurpose":"assertionMethod","proofValue":"z4DEMwgRCZnRddGPPevbaafihRwj4ng3dn5EwmnnaeMVMp25niKWZ3cW1rdfWMtfp5dpCmNEjfJtvbnnpUsZcy9c6","type":"DataIntegrityProof","verificationMethod":"did:key#z7dNyxjs9BUfsbX11VG4BGDMB3Wg1Pq2NqhSwTBT8UuRC"},"type":["VerifiableCredential","AlumniCredential"],"validFrom":"2023-03-05T19:23:24Z","validUntil":"2023-12-31T19:23:24Z"}"#;

    fn alumni_credential() -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "AlumniCredential"],
            "issuer": {"id": "did:example:university", "name": "Example University"},
            "issuanceDate": "2023-03-05T19:23:24Z",
            "expirationDate": "2033-03-05T19:23:24Z",
            "credentialSubject": {"id": "did:example:alice", "alumniOf": "Example University"},
            "evidence": [{"type": "DocumentVerification", "verifier": "did:example:clerk"}]
        })
    }

    #[test]
    fn test_vc_keeps_unknown_members() {
        let credential = VerifiableCredential::from_value(&alumni_credential()).unwrap();

        assert_eq!(credential.issuer.id(), "did:example:university");
        assert_eq!(
            credential.valid_from(),
            Some(Utc.with_ymd_and_hms(2023, 3, 5, 19, 23, 24).unwrap())
        );
        assert_eq!(
            json_canon::to_string(&credential).unwrap(),
            json_canon::to_string(&alumni_credential()).unwrap()
        );
    }

    #[test]
    fn test_vc_verify_vc_proof() {
        // test parse string into a VerifiableCredential struct
        let secured_vc: VerifiableCredential = serde_json::from_str(SECURED_VC).unwrap();
        secured_vc.validate().unwrap();

        // Test serialize VerifiableCredential struct into a JSON value
        let secure_doc_json_value: Value = serde_json::to_value(&secured_vc).unwrap();
        let (_, proofs) = detach_proofs(&secure_doc_json_value).unwrap();
        let secured_proof = proofs.into_iter().next().unwrap();

        // The verification method carries the raw public key after the '#'.
        let vm = secured_proof.verification_method.clone();
        let (_, public_key_multibase) = vm.rsplit_once('#').unwrap();
        let (_, public_key) = multibase::decode(public_key_multibase).unwrap();

        let contexts = ContextLoader::new();
        let verifier = DataIntegrity::new(
            secured_proof,
            KeyPair::from_public_key(Curve::Ed25519, &public_key).unwrap(),
            &contexts,
        );
        verifier.verify(&secure_doc_json_value).unwrap();
    }

    #[test]
    fn test_vc_structural_errors() {
        let cases = [
            ("@context", json!("https://example.com/context")),
            ("type", json!(["AlumniCredential"])),
            ("issuer", json!("not a uri")),
            ("credentialSubject", json!([])),
            ("issuanceDate", json!("yesterday")),
        ];

        for (member, value) in cases {
            let mut credential = alumni_credential();
            credential[member] = value;
            assert!(
                matches!(VerifiableCredential::from_value(&credential), Err(Error::Malformed(_))),
                "{member} should be rejected"
            );
        }

        let mut credential = alumni_credential();
        credential.as_object_mut().unwrap().remove("credentialSubject");
        assert!(VerifiableCredential::from_value(&credential).is_err());

        let mut credential = alumni_credential();
        credential["validUntil"] = json!("2020-01-01T00:00:00Z");
        assert!(VerifiableCredential::from_value(&credential).is_err());

        assert!(VerifiableCredential::from_value(&json!([alumni_credential()])).is_err());
    }

    #[test]
    fn test_vc_validity_period() {
        let credential = VerifiableCredential::from_value(&alumni_credential()).unwrap();

        let before = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap();

        assert!(matches!(credential.check_validity_period(before), Err(Error::NotYetValid(_))));
        assert!(credential.check_validity_period(during).is_ok());
        assert!(matches!(credential.check_validity_period(after), Err(Error::Expired(_))));
    }

    #[test]
    fn test_vp() {
        let presentation = json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": "VerifiablePresentation",
            "holder": "did:example:alice",
            "verifiableCredential": [alumni_credential(), SECURED_VC]
        });

        let vp = VerifiablePresentation::from_value(&presentation).unwrap();
        assert_eq!(vp.holder.as_ref().map(Issuer::id), Some("did:example:alice"));
        assert_eq!(vp.credentials().count(), 2);

        let mut broken = presentation.clone();
        broken["verifiableCredential"][0]["type"] = json!("AlumniCredential");
        let err = VerifiablePresentation::from_value(&broken).unwrap_err();
        assert!(err.to_string().contains("verifiableCredential[0]"));

        let mut broken = presentation;
        broken["type"] = json!(["VerifiableCredential"]);
        assert!(VerifiablePresentation::from_value(&broken).is_err());
    }
}
