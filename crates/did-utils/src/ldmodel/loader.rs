use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Well-known contexts every loader resolves without a bundle.
pub const BUILTIN_CONTEXTS: &[&str] = &[
    "https://www.w3.org/2018/credentials/v1",
    "https://www.w3.org/ns/credentials/v2",
    "https://www.w3.org/2018/credentials/examples/v1",
    "https://www.w3.org/ns/credentials/examples/v2",
    "https://www.w3.org/ns/did/v1",
    "https://w3id.org/did/v1",
    "https://w3id.org/did-resolution/v1",
    "https://w3id.org/security/v1",
    "https://w3id.org/security/v2",
    "https://w3id.org/security/data-integrity/v1",
    "https://w3id.org/security/data-integrity/v2",
    "https://w3id.org/security/multikey/v1",
    "https://w3id.org/security/suites/jws-2020/v1",
    "https://w3id.org/security/suites/ed25519-2020/v1",
    "https://w3id.org/security/suites/secp256k1-2019/v1",
    "https://w3id.org/vc/status-list/2021/v1",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("invalid context URL {0:?}")]
    InvalidUrl(String),
    #[error("invalid context document: {0}")]
    InvalidDocument(String),
    #[error("unresolvable context {0:?}")]
    Unresolvable(String),
    #[error("document has no @context")]
    MissingContext,
    #[error("conflicting definitions for context {0:?}")]
    ConflictingEntry(String),
}

/// Where a context referenced by a document was found.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextSource<'a> {
    /// One of [`BUILTIN_CONTEXTS`].
    Builtin(&'a str),
    /// A caller-supplied context document.
    Bundled(&'a str, &'a Value),
    /// An object written inline in the document's `@context`.
    Inline(&'a Value),
}

/// Offline JSON-LD context loader.
///
/// Resolves context URLs against the built-in set and a caller-supplied
/// bundle. It never reaches the network.
#[derive(Debug, Clone, Default)]
pub struct ContextLoader {
    documents: HashMap<String, Value>,
}

impl ContextLoader {
    /// Loader knowing only the built-in contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader extended with a bundle of context documents keyed by URL.
    ///
    /// Every entry is validated before the loader is returned.
    pub fn with_documents(documents: HashMap<String, Value>) -> Result<Self, ContextError> {
        for (url, body) in &documents {
            validate_context_url(url)?;
            validate_context_document(body)?;
        }
        Ok(Self { documents })
    }

    /// Number of bundled documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Resolves a single context URL.
    pub fn load<'a>(&'a self, url: &'a str) -> Result<ContextSource<'a>, ContextError> {
        if let Some((url, body)) = self.documents.get_key_value(url) {
            return Ok(ContextSource::Bundled(url, body));
        }
        BUILTIN_CONTEXTS
            .iter()
            .find(|builtin| **builtin == url)
            .map(|builtin| ContextSource::Builtin(*builtin))
            .ok_or_else(|| ContextError::Unresolvable(url.to_string()))
    }

    /// Resolves every context referenced by a JSON-LD document's `@context`.
    pub fn resolve_document<'a>(&'a self, document: &'a Value) -> Result<Vec<ContextSource<'a>>, ContextError> {
        let context = document.get("@context").ok_or(ContextError::MissingContext)?;

        match context {
            Value::String(url) => Ok(vec![self.load(url)?]),
            Value::Object(_) => Ok(vec![ContextSource::Inline(context)]),
            Value::Array(entries) if !entries.is_empty() => entries
                .iter()
                .map(|entry| match entry {
                    Value::String(url) => self.load(url),
                    Value::Object(_) => Ok(ContextSource::Inline(entry)),
                    other => Err(ContextError::InvalidDocument(format!("unexpected @context entry {other}"))),
                })
                .collect(),
            other => Err(ContextError::InvalidDocument(format!("unexpected @context value {other}"))),
        }
    }
}

/// Checks that a context URL is absolute.
pub fn validate_context_url(url: &str) -> Result<(), ContextError> {
    Url::parse(url).map(|_| ()).map_err(|_| ContextError::InvalidUrl(url.to_string()))
}

/// Checks that a value is a JSON-LD context document: an object whose
/// `@context` member is an object, an array or a string.
pub fn validate_context_document(body: &Value) -> Result<(), ContextError> {
    let object = body
        .as_object()
        .ok_or_else(|| ContextError::InvalidDocument("context document must be a JSON object".to_string()))?;

    match object.get("@context") {
        Some(Value::Object(_) | Value::Array(_) | Value::String(_)) => Ok(()),
        Some(_) => Err(ContextError::InvalidDocument(
            "@context must be an object, an array or a string".to_string(),
        )),
        None => Err(ContextError::MissingContext),
    }
}
