//! Issuance of credentials and presentations.
//!
//! Documents are signed either in one shot with a local key ([`issue`]) or
//! in two phases ([`prepare`] then [`complete`]) when the signing key lives
//! elsewhere.

use chrono::Utc;
use did_utils::{
    crypto::KeyPair,
    didcore::VerificationRelationship,
    ldmodel::ContextLoader,
    proof::{
        canonicalize_proof, configure, decode_proof_value, embed_proof, encode_proof_value, hash_data, CryptoProof,
        DataIntegrity, Proof, Suite,
    },
    vc::{CREDENTIALS_V1_CONTEXT, VERIFIABLE_PRESENTATION_TYPE},
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    derivation::{key_to_verification_method, verification_method_for_did, MethodPattern},
    error::{Error, ErrorKind, Result},
    options::{ProofFormat, ProofOptions},
    token::{DocumentKind, PreparedProof},
};

/// Signs a document with a local key and embeds the proof.
pub fn issue(
    kind: DocumentKind,
    document: &Value,
    options: &ProofOptions,
    key: &KeyPair,
    contexts: &ContextLoader,
) -> Result<Value> {
    kind.validate(document)?;
    contexts.resolve_document(document)?;

    if !key.has_secret() {
        return Err(Error::msg(
            ErrorKind::MissingPrivateKey,
            format!("a private key is needed to issue a {kind}"),
        ));
    }
    let suite = Suite::select(options.cryptosuite.as_deref(), key.curve())?;

    let verification_method = match &options.verification_method {
        Some(vm) => vm.clone(),
        None => default_verification_method(kind, document, key)?,
    };
    let config = configure(
        &options.to_proof(&verification_method, options.purpose_or(kind.default_purpose())),
        suite,
    );

    let proof = DataIntegrity::new(config, key.clone(), contexts)
        .proof(document)
        .map_err(|err| Error::from(err).wrap(ErrorKind::Issuance, format!("could not sign {kind}")))?;

    let mut secured = document.clone();
    embed_proof(&mut secured, &proof)
        .map_err(|err| Error::from(err).wrap(ErrorKind::Issuance, format!("could not embed proof into {kind}")))?;

    info!("issued {kind} with {suite} proof by {verification_method}");
    Ok(secured)
}

/// Computes everything an external signer needs to secure a document.
///
/// `key` is the signer's public key; `verification_method` the id its proof
/// will reference, when known from the key descriptor.
pub fn prepare(
    kind: DocumentKind,
    document: &Value,
    options: &ProofOptions,
    key: &KeyPair,
    verification_method: Option<&str>,
    contexts: &ContextLoader,
) -> Result<PreparedProof> {
    kind.validate(document)?;
    contexts.resolve_document(document)?;

    if options.proof_format() == ProofFormat::Jwt {
        return Err(Error::msg(
            ErrorKind::UnsupportedSuite,
            "two-phase issuance produces Data Integrity proofs only",
        ));
    }
    let suite = Suite::select(options.cryptosuite.as_deref(), key.curve())?;

    let verification_method = match options.verification_method.as_deref().or(verification_method) {
        Some(vm) => vm.to_string(),
        None => default_verification_method(kind, document, key)?,
    };
    let config = configure(
        &options.to_proof(&verification_method, options.purpose_or(kind.default_purpose())),
        suite,
    );

    let hashes = hash_data(suite, &config, document, contexts)?;
    let token = PreparedProof::new(kind, suite, config, &hashes.document_hash, &hashes.signing_input());

    debug!("prepared {kind} token {} for {verification_method}", token.token_id);
    Ok(token)
}

/// Embeds an externally produced signature, consuming the token.
pub fn complete(kind: DocumentKind, document: &Value, token: PreparedProof, signature: &str) -> Result<Value> {
    if token.kind != kind {
        return Err(Error::msg(
            ErrorKind::TokenMismatch,
            format!("token was prepared for a {}, not a {kind}", token.kind),
        ));
    }

    if token.is_expired(Utc::now()) {
        return Err(Error::msg(
            ErrorKind::TokenMismatch,
            format!("token {} expired at {}", token.token_id, token.expires),
        ));
    }

    let suite = token.suite()?;
    let document_hash = suite.hash(canonical_without_proof(document)?.as_bytes());
    if document_hash != token.document_hash_bytes()? {
        return Err(Error::msg(
            ErrorKind::TokenMismatch,
            format!("{kind} differs from the one token {} was prepared for", token.token_id),
        ));
    }

    check_token_proof(suite, &token, &document_hash)?;

    let signature = decode_proof_value(signature.trim())?;
    let signature = suite.normalize_signature(&signature)?;

    let proof = Proof {
        proof_value: Some(encode_proof_value(&signature)),
        ..token.proof
    };

    let mut secured = document.clone();
    embed_proof(&mut secured, &proof)
        .map_err(|err| Error::from(err).wrap(ErrorKind::Issuance, format!("could not embed proof into {kind}")))?;

    info!("completed {kind} token {}", token.token_id);
    Ok(secured)
}

/// Issues a presentation proving control of `did`.
pub fn did_auth(did: &str, options: &ProofOptions, key: &KeyPair, contexts: &ContextLoader) -> Result<Value> {
    let (presentation, options) = authentication_presentation(did, options, key)?;
    issue(DocumentKind::Presentation, &presentation, &options, key, contexts)
}

/// Unsigned presentation held by `did`, with the options securing it by
/// a key of `did` for authentication.
pub fn authentication_presentation(did: &str, options: &ProofOptions, key: &KeyPair) -> Result<(Value, ProofOptions)> {
    let verification_method = match &options.verification_method {
        Some(vm) => vm.clone(),
        None => verification_method_for_did(did, key)
            .map(|vm| vm.id)
            .ok_or_else(|| Error::msg(ErrorKind::Issuance, format!("key does not control {did}")))?,
    };

    let presentation = json!({
        "@context": [CREDENTIALS_V1_CONTEXT],
        "type": [VERIFIABLE_PRESENTATION_TYPE],
        "holder": did,
    });
    let options = ProofOptions {
        proof_purpose: Some(VerificationRelationship::Authentication),
        verification_method: Some(verification_method),
        ..options.clone()
    };

    Ok((presentation, options))
}

pub fn issue_credential(credential: &Value, options: &ProofOptions, key: &KeyPair, contexts: &ContextLoader) -> Result<Value> {
    issue(DocumentKind::Credential, credential, options, key, contexts)
}

pub fn issue_presentation(presentation: &Value, options: &ProofOptions, key: &KeyPair, contexts: &ContextLoader) -> Result<Value> {
    issue(DocumentKind::Presentation, presentation, options, key, contexts)
}

/// Verification method `key` is published under in the DID document of the
/// document's issuer or holder.
///
/// A presentation without a holder is signed under the key's `did:key`.
pub(crate) fn default_verification_method(kind: DocumentKind, document: &Value, key: &KeyPair) -> Result<String> {
    match kind.controller(document)? {
        Some(controller) => verification_method_for_did(&controller, key).map(|vm| vm.id).ok_or_else(|| {
            Error::msg(
                ErrorKind::Issuance,
                format!("key does not control {controller}, pass a verificationMethod"),
            )
        }),
        None => Ok(key_to_verification_method(MethodPattern::Key, key)?.id),
    }
}

// The token's proof configuration must be the one its signing input was
// computed from.
fn check_token_proof(suite: Suite, token: &PreparedProof, document_hash: &[u8]) -> Result<()> {
    let mismatch = |reason: &str| -> Result<()> {
        Err(Error::msg(
            ErrorKind::TokenMismatch,
            format!("token {} {reason}", token.token_id),
        ))
    };

    if token.proof.cryptosuite.as_deref() != Some(token.cryptosuite.as_str()) {
        return mismatch("proof names another cryptosuite");
    }
    if token.proof.proof_value.is_some() {
        return mismatch("proof already carries a proof value");
    }

    let proof_hash = suite.hash(canonicalize_proof(&token.proof)?.as_bytes());
    if [proof_hash.as_slice(), document_hash].concat() != token.signing_input_bytes()? {
        return mismatch("proof differs from the one its signing input was computed from");
    }
    Ok(())
}

fn canonical_without_proof(document: &Value) -> Result<String> {
    let mut object = document
        .as_object()
        .cloned()
        .ok_or_else(|| Error::msg(ErrorKind::MalformedInput, "document must be a JSON object"))?;
    object.remove("proof");

    json_canon::to_string(&Value::Object(object)).map_err(|err| Error::new(ErrorKind::Issuance, err))
}
