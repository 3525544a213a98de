//! Context documents supplied by callers.
//!
//! Entries are validated one by one with [`create_context`], then gathered
//! into a [`ContextBundle`] by [`create_context_map`], which either accepts
//! the whole batch or none of it.

use std::collections::HashMap;

use did_utils::ldmodel::{validate_context_document, validate_context_url, ContextError, ContextLoader};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// A context document and the URL it is published at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub url: String,
    pub document: Value,
}

impl ContextEntry {
    fn validate(&self) -> std::result::Result<(), ContextError> {
        validate_context_url(&self.url)?;
        validate_context_document(&self.document)
    }

    /// JCS serialization of the entry.
    pub fn to_canonical_string(&self) -> Result<String> {
        json_canon::to_string(self).map_err(|err| Error::new(ErrorKind::Internal, err))
    }
}

/// Context documents keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextBundle(HashMap<String, Value>);

impl ContextBundle {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&Value> {
        self.0.get(url)
    }

    /// Parses a bundle previously returned by [`create_context_map`].
    pub fn from_json(json: &str) -> Result<Self> {
        let documents: HashMap<String, Value> =
            serde_json::from_str(json.trim()).map_err(|err| Error::new(ErrorKind::InvalidContext, err))?;
        Ok(Self(documents))
    }

    /// Loader resolving the bundled documents and the built-in contexts.
    pub fn loader(&self) -> Result<ContextLoader> {
        Ok(ContextLoader::with_documents(self.0.clone())?)
    }
}

/// Validates a context document and returns it as an entry.
pub fn create_context(url: &str, json: &str) -> Result<ContextEntry> {
    let document: Value =
        serde_json::from_str(json.trim()).map_err(|err| Error::new(ErrorKind::InvalidContext, err))?;

    let entry = ContextEntry {
        url: url.to_string(),
        document,
    };
    entry.validate()?;

    Ok(entry)
}

/// Builds a bundle from entries, all of which must be valid.
///
/// An entry is an object with a `url` and a `document`, the latter given
/// either as JSON or as a string holding JSON. Every failing entry is named
/// in the error, by index and URL.
pub fn create_context_map(entries: &[Value]) -> Result<ContextBundle> {
    let mut documents: HashMap<String, Value> = HashMap::new();
    let mut failures = Vec::new();

    for (index, raw) in entries.iter().enumerate() {
        let entry = match parse_entry(raw) {
            Ok(entry) => entry,
            Err(reason) => {
                let url = raw.get("url").and_then(Value::as_str).unwrap_or("<missing url>");
                failures.push(format!("entry {index} ({url}): {reason}"));
                continue;
            }
        };

        if let Err(err) = entry.validate() {
            failures.push(format!("entry {index} ({}): {err}", entry.url));
            continue;
        }

        match documents.get(&entry.url) {
            Some(existing) if *existing != entry.document => {
                let err = ContextError::ConflictingEntry(entry.url.clone());
                failures.push(format!("entry {index} ({}): {err}", entry.url));
            }
            Some(_) => (),
            None => {
                documents.insert(entry.url, entry.document);
            }
        }
    }

    if !failures.is_empty() {
        return Err(Error::msg(ErrorKind::InvalidContext, failures.join("; ")));
    }

    debug!("built context bundle with {} documents", documents.len());
    Ok(ContextBundle(documents))
}

fn parse_entry(raw: &Value) -> std::result::Result<ContextEntry, String> {
    let url = raw
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| "entry has no url".to_string())?;

    let document = match raw.get("document") {
        Some(Value::String(json)) => serde_json::from_str(json).map_err(|err| err.to_string())?,
        Some(document) => document.clone(),
        None => return Err("entry has no document".to_string()),
    };

    Ok(ContextEntry {
        url: url.to_string(),
        document,
    })
}
