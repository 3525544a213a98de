use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{didcore::Document as DIDDocument, ldmodel::Context, methods::errors::DIDResolutionError};

/// DID Resolution Options.
///
/// Formerly known as "DID resolution input metadata", they provide
/// additional configuration for the DID resolution process.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution-options>`
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DIDResolutionOptions {
    // See https://www.w3.org/TR/did-spec-registries/#accept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<MediaType>,
    // See https://w3c.github.io/did-resolution/#caching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cache: Option<bool>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID Resolution Output.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution>`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutput {
    #[serde(rename = "@context")]
    pub context: Context,
    // See https://www.w3.org/TR/did-core/#dfn-diddocument
    pub did_document: Option<DIDDocument>,
    // See https://www.w3.org/TR/did-core/#dfn-didresolutionmetadata
    pub did_resolution_metadata: Option<DIDResolutionMetadata>,
    // See https://www.w3.org/TR/did-core/#dfn-diddocumentmetadata
    pub did_document_metadata: Option<DIDDocumentMetadata>,
    // Dynamic properties
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl ResolutionOutput {
    /// Successful output carrying a DID document.
    pub fn success(did_document: DIDDocument, content_type: MediaType) -> Self {
        Self {
            context: Context::SingleString(String::from("https://w3id.org/did-resolution/v1")),
            did_document: Some(did_document),
            did_resolution_metadata: Some(DIDResolutionMetadata {
                error: None,
                content_type: Some(content_type.to_string()),
                additional_properties: None,
            }),
            did_document_metadata: Some(DIDDocumentMetadata::default()),
            additional_properties: None,
        }
    }

    /// Failed output carrying only an error in its resolution metadata.
    pub fn failure(error: DIDResolutionError) -> Self {
        Self {
            context: Context::SingleString(String::from("https://w3id.org/did-resolution/v1")),
            did_document: None,
            did_resolution_metadata: Some(DIDResolutionMetadata {
                error: Some(error),
                content_type: None,
                additional_properties: None,
            }),
            did_document_metadata: None,
            additional_properties: None,
        }
    }

    /// The resolution error, if any.
    pub fn error(&self) -> Option<&DIDResolutionError> {
        self.did_resolution_metadata.as_ref().and_then(|metadata| metadata.error.as_ref())
    }
}

/// DID Resolution Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-resolution-metadata>`
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DIDResolutionMetadata {
    // See https://www.w3.org/TR/did-spec-registries/#error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DIDResolutionError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    // See https://www.w3.org/TR/did-spec-registries/#contenttype
    pub content_type: Option<String>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID Document Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-document-metadata>`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DIDDocumentMetadata {
    // See https://www.w3.org/TR/did-spec-registries/#created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    // See https://www.w3.org/TR/did-spec-registries/#updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    // See https://www.w3.org/TR/did-spec-registries/#deactivated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
    // See https://www.w3.org/TR/did-spec-registries/#version_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    // See https://www.w3.org/TR/did-spec-registries/#equivalent_id
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub equivalent_id: Vec<String>,
    // See https://www.w3.org/TR/did-spec-registries/#canonical_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    // Dynamic properties
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

/// DID URL Dereferencing Options.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing-options>`
pub type DereferencingOptions = DIDResolutionOptions;

/// DID URL Dereferencing Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing-metadata>`
pub type DereferencingMetadata = DIDResolutionMetadata;

/// Content Metadata.
///
/// See `<https://www.w3.org/TR/did-core/#metadata-structure>`
pub type ContentMetadata = DIDDocumentMetadata;

/// Dereferencing Output.
///
/// See `<https://www.w3.org/TR/did-core/#did-url-dereferencing>`
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DereferencingOutput {
    #[serde(rename = "@context")]
    pub context: Context,
    // See https://www.w3.org/TR/did-core/#dfn-diddocument
    pub content: Option<Content>,
    // See https://www.w3.org/TR/did-core/#did-url-dereferencing-metadata
    pub dereferencing_metadata: Option<DereferencingMetadata>,
    // See https://www.w3.org/TR/did-core/#dfn-diddocumentmetadata
    pub content_metadata: Option<ContentMetadata>,
    // Dynamic properties
    #[serde(flatten)]
    pub additional_properties: Option<HashMap<String, Value>>,
}

impl DereferencingOutput {
    pub(crate) fn failure(error: DIDResolutionError) -> Self {
        Self {
            context: Context::SingleString(String::from("https://www.w3.org/ns/did/v1")),
            content: None,
            dereferencing_metadata: Some(DereferencingMetadata {
                error: Some(error),
                content_type: None,
                additional_properties: None,
            }),
            content_metadata: None,
            additional_properties: None,
        }
    }

    /// The dereferencing error, if any.
    pub fn error(&self) -> Option<&DIDResolutionError> {
        self.dereferencing_metadata.as_ref().and_then(|metadata| metadata.error.as_ref())
    }
}

/// A resource returned by DID URL dereferencing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Content {
    /// DID Document
    DIDDocument(DIDDocument),
    /// URL
    URL(String),
    /// Other (e.g. verification method map)
    Data(Value),
}

/// Media type for resolution input and output metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MediaType {
    #[serde(rename = "application/json")]
    Json,
    #[serde(rename = "application/did+json")]
    DidJson,
    #[serde(rename = "application/did+ld+json")]
    DidLdJson,
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Json => write!(f, "application/json"),
            MediaType::DidJson => write!(f, "application/did+json"),
            MediaType::DidLdJson => write!(f, "application/did+ld+json"),
        }
    }
}

/// Serves derefencing query given a DID document.
pub(super) fn dereference_did_document(
    diddoc: &DIDDocument,
    query: &HashMap<String, String>,
    fragment: &Option<String>,
) -> Result<Content, DIDResolutionError> {
    // Primary resource
    if let Some(service) = query.get("service") {
        let needle = format!("{}#{}", diddoc.id, service);
        let entries = diddoc.service.as_deref().unwrap_or_default();
        let found: Vec<_> = entries
            .iter()
            .filter(|entry| diddoc.absolute_id(&entry.id) == needle)
            .map(|entry| &entry.service_endpoint)
            .collect();

        let endpoint = match found.as_slice() {
            [] => return Err(DIDResolutionError::NotFound),
            [endpoint] => *endpoint,
            _ => return Err(DIDResolutionError::NotAllowedLocalDuplicateKey),
        };

        let relative_ref = query.get("relativeRef");
        let endpoint = match endpoint {
            Value::String(url) => url,
            // Maps and sets cannot be extended with a relative reference or fragment.
            other if relative_ref.is_none() && fragment.is_none() => return Ok(Content::Data(other.clone())),
            _ => return Err(DIDResolutionError::InternalError),
        };

        if (fragment.is_some() || relative_ref.is_some()) && endpoint.contains('#') {
            return Err(DIDResolutionError::InternalError);
        }

        return Ok(Content::URL(format!(
            "{}{}{}",
            endpoint,
            relative_ref.map(String::as_str).unwrap_or_default(),
            fragment.as_ref().map_or(String::new(), |frag| format!("#{frag}"))
        )));
    } else if !query.is_empty() {
        // Resort to returning whole DID document as other query parameters
        // are not supported by this default dereferencing implementation.
        return Ok(Content::DIDDocument(diddoc.clone()));
    }

    // Secondary resource without primary resource
    if let Some(fragment) = fragment {
        let needle = format!("{}#{}", diddoc.id, fragment);

        let haystack = [
            json!(diddoc.authentication.as_deref().unwrap_or_default()),
            json!(diddoc.assertion_method.as_deref().unwrap_or_default()),
            json!(diddoc.key_agreement.as_deref().unwrap_or_default()),
            json!(diddoc.capability_invocation.as_deref().unwrap_or_default()),
            json!(diddoc.capability_delegation.as_deref().unwrap_or_default()),
            json!(diddoc.verification_method.as_deref().unwrap_or_default()),
            json!(diddoc.service.as_deref().unwrap_or_default()),
        ];

        let flat_haystack = haystack.iter().filter_map(Value::as_array).flatten();
        let found: Vec<_> = flat_haystack
            .filter(|entry| {
                entry
                    .get("id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| diddoc.absolute_id(id) == needle)
            })
            .collect();

        return match found.as_slice() {
            [] => Err(DIDResolutionError::NotFound),
            [entry] => Ok(Content::Data((*entry).clone())),
            _ => Err(DIDResolutionError::NotAllowedLocalDuplicateKey),
        };
    }

    // Resort to returning whole DID document
    Ok(Content::DIDDocument(diddoc.clone()))
}
