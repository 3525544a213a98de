use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::errors::DIDResolutionError;

lazy_static! {
    // did = "did:" method-name ":" method-specific-id
    // See https://www.w3.org/TR/did-core/#did-syntax
    static ref DID_SYNTAX: Regex =
        Regex::new(r"^did:([a-z0-9]+):((?:[A-Za-z0-9._-]|%[0-9A-Fa-f]{2}|:)*(?:[A-Za-z0-9._-]|%[0-9A-Fa-f]{2}))$").unwrap();
}

pub type ParsedDIDUrl = (String, HashMap<String, String>, Option<String>);

/// Returns the method name of a syntactically valid DID.
pub fn did_method(did: &str) -> Result<&str, DIDResolutionError> {
    DID_SYNTAX
        .captures(did)
        .and_then(|captures| captures.get(1))
        .map(|method| method.as_str())
        .ok_or(DIDResolutionError::InvalidDid)
}

/// Parses DID URL into (did, query, fragment)
///
/// The DID part is kept verbatim: method-specific identifiers are case-sensitive.
pub fn parse_did_url(did_url: &str) -> Result<ParsedDIDUrl, DIDResolutionError> {
    let (rest, fragment) = match did_url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment.to_string())),
        None => (did_url, None),
    };

    let (did, query) = match rest.split_once('?') {
        Some((did, query)) => (did, query),
        None => (rest, ""),
    };

    // Paths are not supported by any of the methods implemented here.
    if did.contains('/') || did_method(did).is_err() {
        return Err(DIDResolutionError::InvalidDidUrl);
    }

    let query = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    Ok((did.to_string(), query, fragment))
}
