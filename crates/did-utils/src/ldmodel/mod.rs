//! Provides Linked Data models for representing DIDs and related data.

mod loader;

pub use loader::{validate_context_document, validate_context_url, ContextError, ContextLoader, ContextSource, BUILTIN_CONTEXTS};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Represents the JSON-LD context.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
// The @context property defines the vocabulary used in the JSON-LD document.
// It provides a way to map the keys in the JSON structure to specific terms,
// properties, and classes from external vocabularies.
pub enum Context {
    /// A single string value.
    SingleString(String),
    /// A set of string values.
    SetOfString(Vec<String>),
    /// A JSON object, or an array mixing strings and objects.
    JsonObject(Value),
}

impl Context {
    /// Builds a context from a list of URLs, collapsing a single entry.
    pub fn from_urls(urls: &[&str]) -> Self {
        match urls {
            [single] => Context::SingleString(single.to_string()),
            many => Context::SetOfString(many.iter().map(|url| url.to_string()).collect()),
        }
    }

    /// The first entry of the context, when it is a URL.
    pub fn first_url(&self) -> Option<&str> {
        match self {
            Context::SingleString(url) => Some(url),
            Context::SetOfString(urls) => urls.first().map(String::as_str),
            Context::JsonObject(Value::Array(entries)) => entries.first().and_then(Value::as_str),
            Context::JsonObject(_) => None,
        }
    }

    /// Whether the given URL is one of the context's entries.
    pub fn contains(&self, url: &str) -> bool {
        match self {
            Context::SingleString(single) => single == url,
            Context::SetOfString(urls) => urls.iter().any(|entry| entry == url),
            Context::JsonObject(Value::Array(entries)) => entries.iter().any(|entry| entry.as_str() == Some(url)),
            Context::JsonObject(_) => false,
        }
    }
}
