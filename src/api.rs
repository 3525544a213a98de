//! Text surface of the toolkit.
//!
//! Every operation takes and returns UTF-8 JSON. A failing operation returns
//! `None` and records its error in the calling thread's status slot, read
//! back with [`last_error_code`] and [`last_error_message`]. A successful one
//! returns `Some` and clears the slot.

use std::future::Future;

use did_utils::{
    crypto::KeyPair,
    ldmodel::ContextLoader,
    methods::{DIDResolutionOptions, MethodRegistry},
};
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::EngineConfig,
    context::{self, ContextBundle},
    derivation::{self, MethodPattern},
    error::{Error, ErrorKind, Result},
    issuer, jwt,
    options::{ProofFormat, ProofOptions},
    resolution, status,
    token::{self, DocumentKind, PreparedProof},
    verifier,
};

pub use crate::status::{last_error_code, last_error_message};

lazy_static! {
    static ref CONFIG: EngineConfig = EngineConfig::load();
}

/// Version of the toolkit.
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Generates a key on the named curve, returned as a private JWK.
pub fn generate_key(curve: &str) -> Option<String> {
    status::report(derivation::generate_key(curve).and_then(|key| to_json(&derivation::key_to_jwk(&key, true)?)))
}

pub fn key_to_did(pattern: &str, jwk: &str) -> Option<String> {
    status::report(derive(pattern, jwk).and_then(|(pattern, key)| derivation::key_to_did(pattern, &key)))
}

pub fn key_to_verification_method(pattern: &str, jwk: &str) -> Option<String> {
    status::report(
        derive(pattern, jwk)
            .and_then(|(pattern, key)| derivation::key_to_verification_method(pattern, &key))
            .and_then(|vm| to_json(&vm)),
    )
}

pub fn issue_credential(credential: &str, options: &str, jwk: &str, bundle: Option<&str>) -> Option<String> {
    status::report(issue(DocumentKind::Credential, credential, options, jwk, bundle))
}

pub fn issue_presentation(presentation: &str, options: &str, jwk: &str, bundle: Option<&str>) -> Option<String> {
    status::report(issue(DocumentKind::Presentation, presentation, options, jwk, bundle))
}

pub fn verify_credential(credential: &str, options: &str, bundle: Option<&str>) -> Option<String> {
    status::report(verify(DocumentKind::Credential, credential, options, bundle))
}

pub fn verify_presentation(presentation: &str, options: &str, bundle: Option<&str>) -> Option<String> {
    status::report(verify(DocumentKind::Presentation, presentation, options, bundle))
}

pub fn prepare_issue_credential(credential: &str, options: &str, descriptor: &str, bundle: Option<&str>) -> Option<String> {
    status::report(prepare(DocumentKind::Credential, credential, options, descriptor, bundle))
}

pub fn prepare_issue_presentation(
    presentation: &str,
    options: &str,
    descriptor: &str,
    bundle: Option<&str>,
) -> Option<String> {
    status::report(prepare(DocumentKind::Presentation, presentation, options, descriptor, bundle))
}

pub fn complete_issue_credential(credential: &str, token: &str, signature: &str) -> Option<String> {
    status::report(complete(DocumentKind::Credential, credential, token, signature))
}

pub fn complete_issue_presentation(presentation: &str, token: &str, signature: &str) -> Option<String> {
    status::report(complete(DocumentKind::Presentation, presentation, token, signature))
}

/// Resolves a DID, returning its DID document.
pub fn resolve_did(did: &str, metadata: &str) -> Option<String> {
    status::report(resolve(did, metadata))
}

/// Dereferences a DID URL, returning the resource it points at.
pub fn dereference_did_url(did_url: &str, metadata: &str) -> Option<String> {
    status::report(dereference(did_url, metadata))
}

pub fn did_auth(did: &str, options: &str, jwk: &str, bundle: Option<&str>) -> Option<String> {
    status::report(authenticate(did, options, jwk, bundle))
}

/// Validates a context document, returning its canonical entry.
pub fn create_context(url: &str, json: &str) -> Option<String> {
    status::report(context::create_context(url, json).and_then(|entry| entry.to_canonical_string()))
}

/// Builds a context bundle from a JSON array of entries.
pub fn create_context_map(entries: &str) -> Option<String> {
    status::report(
        serde_json::from_str::<Vec<Value>>(entries.trim())
            .map_err(|err| Error::new(ErrorKind::InvalidContext, err))
            .and_then(|entries| context::create_context_map(&entries))
            .and_then(|bundle| to_json(&bundle)),
    )
}

fn derive(pattern: &str, jwk: &str) -> Result<(MethodPattern, KeyPair)> {
    Ok((pattern.parse()?, derivation::parse_jwk(jwk)?))
}

fn issue(kind: DocumentKind, document: &str, options: &str, jwk: &str, bundle: Option<&str>) -> Result<String> {
    let document = parse_document(document)?;
    let options = ProofOptions::from_json(options)?;
    let key = derivation::parse_jwk(jwk)?;
    let contexts = loader(bundle)?;

    match options.proof_format() {
        ProofFormat::Ldp => to_json(&issuer::issue(kind, &document, &options, &key, &contexts)?),
        ProofFormat::Jwt => jwt::issue(kind, &document, &options, &key, &contexts),
    }
}

/// Verifies a document, or a VC-JWT when asked for the `jwt` format.
fn verify(kind: DocumentKind, document: &str, options: &str, bundle: Option<&str>) -> Result<String> {
    let options = ProofOptions::from_json(options)?;
    let contexts = loader(bundle)?;
    let registry = registry();

    let report = match options.proof_format() {
        ProofFormat::Ldp => {
            let document = parse_document(document)?;
            block_on(verifier::verify(kind, &document, &options, &contexts, &registry))??
        }
        ProofFormat::Jwt => block_on(jwt::verify(kind, document.trim(), &options, &contexts, &registry))??,
    };
    to_json(&report)
}

fn prepare(kind: DocumentKind, document: &str, options: &str, descriptor: &str, bundle: Option<&str>) -> Result<String> {
    let document = parse_document(document)?;
    let options = ProofOptions::from_json(options)?;
    let descriptor: Value =
        serde_json::from_str(descriptor.trim()).map_err(|err| Error::new(ErrorKind::InvalidKey, err))?;
    let (key, verification_method) = derivation::parse_key_descriptor(&descriptor)?;
    let contexts = loader(bundle)?;

    issuer::prepare(kind, &document, &options, &key, verification_method.as_deref(), &contexts)?.to_json()
}

fn complete(kind: DocumentKind, document: &str, token: &str, signature: &str) -> Result<String> {
    let document = parse_document(document)?;
    let token = PreparedProof::from_json(token)?;

    token::consume_once(token.token_id, token.expires, || {
        to_json(&issuer::complete(kind, &document, token, signature)?)
    })
}

fn resolve(did: &str, metadata: &str) -> Result<String> {
    let options = parse_metadata(metadata)?;
    let registry = registry();

    let output = block_on(resolution::resolve_did(&registry, did.trim(), &options))??;
    to_json(&output.did_document)
}

fn dereference(did_url: &str, metadata: &str) -> Result<String> {
    let options = parse_metadata(metadata)?;
    let registry = registry();

    let content = block_on(resolution::dereference_did_url(&registry, did_url.trim(), &options))??;
    to_json(&content)
}

fn authenticate(did: &str, options: &str, jwk: &str, bundle: Option<&str>) -> Result<String> {
    let options = ProofOptions::from_json(options)?;
    let key = derivation::parse_jwk(jwk)?;
    let contexts = loader(bundle)?;

    match options.proof_format() {
        ProofFormat::Ldp => to_json(&issuer::did_auth(did.trim(), &options, &key, &contexts)?),
        ProofFormat::Jwt => {
            let (presentation, options) = issuer::authentication_presentation(did.trim(), &options, &key)?;
            jwt::issue(DocumentKind::Presentation, &presentation, &options, &key, &contexts)
        }
    }
}

fn parse_document(json: &str) -> Result<Value> {
    let document: Value = serde_json::from_str(json.trim())?;
    if !document.is_object() {
        return Err(Error::msg(ErrorKind::MalformedInput, "document must be a JSON object"));
    }
    Ok(document)
}

fn parse_metadata(json: &str) -> Result<DIDResolutionOptions> {
    let json = json.trim();
    if json.is_empty() || json == "null" {
        return Ok(DIDResolutionOptions::default());
    }
    Ok(serde_json::from_str(json)?)
}

fn loader(bundle: Option<&str>) -> Result<ContextLoader> {
    match bundle.map(str::trim) {
        None | Some("") | Some("null") => Ok(ContextLoader::new()),
        Some(json) => ContextBundle::from_json(json)?.loader(),
    }
}

fn registry() -> MethodRegistry {
    CONFIG.method_registry()
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|err| Error::new(ErrorKind::Internal, err))
}

/// Drives a future to completion on a fresh current-thread runtime.
///
/// Blocking inside a running runtime would stall it, so that is refused.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::msg(
            ErrorKind::Internal,
            "text surface cannot block inside an async runtime, use the async API instead",
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Error::new(ErrorKind::Internal, err))?;
    Ok(runtime.block_on(future))
}
