//! Implements the DID Core specification
//!
//! As specified by [Decentralized Identifiers (DIDs) v1.0 - Core architecture,
//! data model, and representations][did-core].
//!
//! [did-core]: https://www.w3.org/TR/did-core/

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{jwk::Jwk, ldmodel::Context};

// === Structure of a did document ===

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    // The @context property defines the vocabulary used in the JSON-LD document.
    #[serde(rename = "@context")]
    pub context: Context,

    // === Identifier ===

    // Identifier property is mandatory in a did document.
    // see https://www.w3.org/TR/did-core/#dfn-id
    pub id: String,

    // See https://www.w3.org/TR/did-core/#dfn-controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<Controller>,

    // See https://www.w3.org/TR/did-core/#dfn-alsoknownas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<String>>,

    // === Verification Methods ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,

    // === Verification Relationships ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_delegation: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability_invocation: Option<Vec<VerificationMethodType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<VerificationMethodType>>,

    // === Services ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,

    // === Dynamic Properties ===
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Controller {
    SingleString(String),
    SetOfString(Vec<String>),
}

// See https://www.w3.org/TR/did-core/#services
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub service_type: String,

    // A string, a map, or a set composed of one or more strings and/or maps.
    pub service_endpoint: Value,

    // === Additional properties ===
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// Public key material of a verification method.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFormat {
    Base58(String),
    Multibase(String),
    Jwk(Box<Jwk>),
}

// See https://www.w3.org/TR/did-core/#verification-methods
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "RawVerificationMethod", into = "RawVerificationMethod")]
pub struct VerificationMethod {
    pub id: String,

    pub key_type: String,

    pub controller: String,

    pub public_key: Option<KeyFormat>,

    // === Additional properties ===
    pub additional_properties: Option<HashMap<String, Value>>,
}

// Wire shape of a verification method, with one property per key format.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerificationMethod {
    id: String,
    #[serde(rename = "type")]
    key_type: String,
    controller: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    public_key_base58: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    public_key_multibase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    public_key_jwk: Option<Jwk>,
    #[serde(flatten)]
    additional_properties: HashMap<String, Value>,
}

impl From<RawVerificationMethod> for VerificationMethod {
    fn from(raw: RawVerificationMethod) -> Self {
        let public_key = match (raw.public_key_jwk, raw.public_key_multibase, raw.public_key_base58) {
            (Some(jwk), _, _) => Some(KeyFormat::Jwk(Box::new(jwk))),
            (None, Some(multibase), _) => Some(KeyFormat::Multibase(multibase)),
            (None, None, Some(base58)) => Some(KeyFormat::Base58(base58)),
            (None, None, None) => None,
        };

        VerificationMethod {
            id: raw.id,
            key_type: raw.key_type,
            controller: raw.controller,
            public_key,
            additional_properties: (!raw.additional_properties.is_empty()).then_some(raw.additional_properties),
        }
    }
}

impl From<VerificationMethod> for RawVerificationMethod {
    fn from(vm: VerificationMethod) -> Self {
        let (mut public_key_base58, mut public_key_multibase, mut public_key_jwk) = (None, None, None);
        match vm.public_key {
            Some(KeyFormat::Base58(value)) => public_key_base58 = Some(value),
            Some(KeyFormat::Multibase(value)) => public_key_multibase = Some(value),
            Some(KeyFormat::Jwk(jwk)) => public_key_jwk = Some(*jwk),
            None => (),
        }

        RawVerificationMethod {
            id: vm.id,
            key_type: vm.key_type,
            controller: vm.controller,
            public_key_base58,
            public_key_multibase,
            public_key_jwk,
            additional_properties: vm.additional_properties.unwrap_or_default(),
        }
    }
}

/// A verification relationship entry, either a reference or an embedded method.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VerificationMethodType {
    Reference(String),
    Embedded(Box<VerificationMethod>),
}

impl VerificationMethodType {
    pub fn id(&self) -> &str {
        match self {
            VerificationMethodType::Reference(id) => id,
            VerificationMethodType::Embedded(vm) => &vm.id,
        }
    }
}

/// Verification relationships defined by DID Core.
///
/// See `<https://www.w3.org/TR/did-core/#verification-relationships>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRelationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationRelationship::Authentication => "authentication",
            VerificationRelationship::AssertionMethod => "assertionMethod",
            VerificationRelationship::KeyAgreement => "keyAgreement",
            VerificationRelationship::CapabilityInvocation => "capabilityInvocation",
            VerificationRelationship::CapabilityDelegation => "capabilityDelegation",
        }
    }
}

impl fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationRelationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authentication" => Ok(VerificationRelationship::Authentication),
            "assertionMethod" => Ok(VerificationRelationship::AssertionMethod),
            "keyAgreement" => Ok(VerificationRelationship::KeyAgreement),
            "capabilityInvocation" => Ok(VerificationRelationship::CapabilityInvocation),
            "capabilityDelegation" => Ok(VerificationRelationship::CapabilityDelegation),
            other => Err(format!("unknown verification relationship: {other}")),
        }
    }
}

impl Document {
    /// Creates a minimal DID document.
    pub fn new(context: Context, id: &str) -> Self {
        Self {
            context,
            id: id.to_string(),
            controller: None,
            also_known_as: None,
            verification_method: None,
            authentication: None,
            assertion_method: None,
            capability_delegation: None,
            capability_invocation: None,
            key_agreement: None,
            service: None,
            additional_properties: None,
        }
    }

    /// Entries of the given verification relationship.
    pub fn relationship(&self, relationship: VerificationRelationship) -> &[VerificationMethodType] {
        let entries = match relationship {
            VerificationRelationship::Authentication => &self.authentication,
            VerificationRelationship::AssertionMethod => &self.assertion_method,
            VerificationRelationship::KeyAgreement => &self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &self.capability_delegation,
        };
        entries.as_deref().unwrap_or_default()
    }

    /// Expands a possibly relative DID URL (`#key-1`) against this document's id.
    pub fn absolute_id(&self, id: &str) -> String {
        if id.starts_with('#') {
            format!("{}{}", self.id, id)
        } else {
            id.to_string()
        }
    }

    /// Looks up a verification method by id, across `verificationMethod` and
    /// methods embedded in verification relationships.
    pub fn find_verification_method(&self, id: &str) -> Option<VerificationMethod> {
        let needle = self.absolute_id(id);

        let listed = self.verification_method.iter().flatten();
        let embedded = [
            VerificationRelationship::Authentication,
            VerificationRelationship::AssertionMethod,
            VerificationRelationship::KeyAgreement,
            VerificationRelationship::CapabilityInvocation,
            VerificationRelationship::CapabilityDelegation,
        ]
        .into_iter()
        .flat_map(|rel| self.relationship(rel))
        .filter_map(|entry| match entry {
            VerificationMethodType::Embedded(vm) => Some(vm.as_ref()),
            VerificationMethodType::Reference(_) => None,
        });

        listed.chain(embedded).find(|vm| self.absolute_id(&vm.id) == needle).cloned()
    }

    /// Whether the verification method is authorized for the given relationship.
    pub fn is_authorized(&self, id: &str, relationship: VerificationRelationship) -> bool {
        let needle = self.absolute_id(id);
        self.relationship(relationship).iter().any(|entry| self.absolute_id(entry.id()) == needle)
    }
}

impl VerificationMethod {
    /// Creates a verification method.
    pub fn new(id: &str, key_type: &str, controller: &str, public_key: KeyFormat) -> Self {
        Self {
            id: id.to_string(),
            key_type: key_type.to_string(),
            controller: controller.to_string(),
            public_key: Some(public_key),
            additional_properties: None,
        }
    }
}

impl Service {
    /// Creates a service with a string endpoint.
    pub fn new(id: &str, service_type: &str, service_endpoint: &str) -> Self {
        Self {
            id: id.to_string(),
            service_type: service_type.to_string(),
            service_endpoint: Value::String(service_endpoint.to_string()),
            additional_properties: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Document {
        serde_json::from_value(json!({
            "@context": ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/multikey/v1"],
            "id": "did:example:123",
            "verificationMethod": [
                {
                    "id": "did:example:123#key-1",
                    "type": "Multikey",
                    "controller": "did:example:123",
                    "publicKeyMultibase": "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp"
                },
                {
                    "id": "#key-2",
                    "type": "JsonWebKey2020",
                    "controller": "did:example:123",
                    "publicKeyJwk": {
                        "kty": "OKP",
                        "crv": "Ed25519",
                        "x": "O2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik"
                    },
                    "revoked": "2023-01-01T00:00:00Z"
                }
            ],
            "authentication": [
                "#key-2",
                {
                    "id": "did:example:123#key-3",
                    "type": "Multikey",
                    "controller": "did:example:123",
                    "publicKeyMultibase": "zDnaerDaTF5BXEavCrfRZEk316dpbLsfPDZ3WJ5hRTPFU2169"
                }
            ],
            "assertionMethod": ["did:example:123#key-1"],
            "service": [{
                "id": "#linked-domain",
                "type": "LinkedDomains",
                "serviceEndpoint": {"origins": ["https://example.com"]}
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_verification_method_key_formats() {
        let doc = sample_document();
        let methods = doc.verification_method.as_ref().unwrap();

        assert!(matches!(methods[0].public_key, Some(KeyFormat::Multibase(_))));
        assert!(matches!(methods[1].public_key, Some(KeyFormat::Jwk(_))));
        assert_eq!(
            methods[1].additional_properties.as_ref().unwrap().get("revoked"),
            Some(&json!("2023-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_document_serialization_round_trip() {
        let doc = sample_document();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["verificationMethod"][0]["publicKeyMultibase"], "z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp");
        assert_eq!(value["verificationMethod"][1]["publicKeyJwk"]["crv"], "Ed25519");
        assert!(value["verificationMethod"][0].get("publicKeyJwk").is_none());

        let doc_again: Document = serde_json::from_value(value).unwrap();
        assert_eq!(doc_again, doc);
    }

    #[test]
    fn test_find_verification_method() {
        let doc = sample_document();

        assert_eq!(doc.find_verification_method("#key-1").unwrap().id, "did:example:123#key-1");
        assert_eq!(doc.find_verification_method("did:example:123#key-2").unwrap().id, "#key-2");
        assert_eq!(doc.find_verification_method("did:example:123#key-3").unwrap().key_type, "Multikey");
        assert!(doc.find_verification_method("#key-4").is_none());
    }

    #[test]
    fn test_is_authorized() {
        let doc = sample_document();

        assert!(doc.is_authorized("did:example:123#key-1", VerificationRelationship::AssertionMethod));
        assert!(doc.is_authorized("did:example:123#key-2", VerificationRelationship::Authentication));
        assert!(doc.is_authorized("#key-3", VerificationRelationship::Authentication));
        assert!(!doc.is_authorized("did:example:123#key-1", VerificationRelationship::Authentication));
        assert!(!doc.is_authorized("did:example:123#key-1", VerificationRelationship::CapabilityInvocation));
    }
}
