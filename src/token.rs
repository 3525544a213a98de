//! Preparation tokens of two-phase issuance.
//!
//! A token is created by `prepare`, carries everything an external signer
//! needs, and is consumed by `complete`. In Rust the token is moved into
//! `complete`; across the text surface, where tokens travel as JSON, the
//! ids of completed tokens are kept in a process-wide ledger until the
//! tokens expire.

use std::{fmt, str::FromStr};

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use did_utils::{
    crypto::{CoreSign, Curve, KeyPair},
    didcore::VerificationRelationship,
    proof::{encode_proof_value, Proof, Suite},
    vc::{VerifiableCredential, VerifiablePresentation},
};
use lazy_static::lazy_static;
use multibase::Base;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Result};

lazy_static! {
    static ref CONSUMED_TOKENS: DashMap<Uuid, DateTime<Utc>> = DashMap::new();
}

/// How long a prepared token can be completed.
pub const TOKEN_LIFETIME: TimeDelta = TimeDelta::hours(1);

/// Kind of document a proof is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Credential,
    Presentation,
}

impl DocumentKind {
    /// Proof purpose used when the caller does not ask for one.
    pub fn default_purpose(&self) -> VerificationRelationship {
        match self {
            DocumentKind::Credential => VerificationRelationship::AssertionMethod,
            DocumentKind::Presentation => VerificationRelationship::Authentication,
        }
    }

    /// Checks the structure of an unsigned document of this kind.
    pub fn validate(&self, document: &Value) -> Result<()> {
        match self {
            DocumentKind::Credential => VerifiableCredential::from_value(document)?.validate()?,
            DocumentKind::Presentation => VerifiablePresentation::from_value(document)?.validate()?,
        }
        Ok(())
    }

    /// DID whose keys may secure the document: the credential's issuer or
    /// the presentation's holder.
    pub fn controller(&self, document: &Value) -> Result<Option<String>> {
        let controller = match self {
            DocumentKind::Credential => Some(VerifiableCredential::from_value(document)?.issuer.id().to_string()),
            DocumentKind::Presentation => VerifiablePresentation::from_value(document)?
                .holder
                .map(|holder| holder.id().to_string()),
        };
        Ok(controller)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Credential => f.write_str("credential"),
            DocumentKind::Presentation => f.write_str("presentation"),
        }
    }
}

/// Proof prepared for signing by a key held elsewhere.
///
/// Hashes are multibase base64url strings. The signer signs the decoded
/// `signingInput` with its key, exactly as a local key would, and hands the
/// signature back to `complete`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedProof {
    pub token_id: Uuid,
    pub kind: DocumentKind,
    pub cryptosuite: String,
    /// Curve of the signing key, naming the suite among those sharing a cryptosuite.
    pub curve: String,
    /// Proof configuration, without a proof value.
    pub proof: Proof,
    pub document_hash: String,
    pub signing_input: String,
    /// The token cannot be completed after this instant.
    pub expires: DateTime<Utc>,
}

impl PreparedProof {
    pub(crate) fn new(kind: DocumentKind, suite: Suite, proof: Proof, document_hash: &[u8], signing_input: &[u8]) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            kind,
            cryptosuite: suite.cryptosuite().to_string(),
            curve: suite.curve().to_string(),
            proof,
            document_hash: multibase::encode(Base::Base64Url, document_hash),
            signing_input: multibase::encode(Base::Base64Url, signing_input),
            expires: Utc::now().trunc_subsecs(0) + TOKEN_LIFETIME,
        }
    }

    /// Parses a token serialized by [`PreparedProof::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json.trim()).map_err(|err| {
            Error::new(ErrorKind::MalformedInput, err).wrap(ErrorKind::MalformedInput, "invalid preparation token")
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| Error::new(ErrorKind::Internal, err))
    }

    /// The suite the token was prepared for.
    pub fn suite(&self) -> Result<Suite> {
        let curve = Curve::from_str(&self.curve)
            .map_err(|err| Error::new(ErrorKind::TokenMismatch, err).wrap(ErrorKind::TokenMismatch, "unknown token curve"))?;

        let suite = Suite::for_curve(curve);
        if !suite.matches(&self.cryptosuite) {
            return Err(Error::msg(
                ErrorKind::TokenMismatch,
                format!("cryptosuite {} does not match a {curve} key", self.cryptosuite),
            ));
        }
        Ok(suite)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    pub fn document_hash_bytes(&self) -> Result<Vec<u8>> {
        decode_hash(&self.document_hash)
    }

    pub fn signing_input_bytes(&self) -> Result<Vec<u8>> {
        decode_hash(&self.signing_input)
    }

    /// Signs the token's signing input, returning a multibase signature.
    pub fn sign(&self, key: &KeyPair) -> Result<String> {
        let suite = self.suite()?;
        if key.curve() != suite.curve() {
            return Err(Error::msg(
                ErrorKind::UnsupportedSuite,
                format!("token was prepared for {suite}, got a {} key", key.curve()),
            ));
        }

        let signature = key.sign(&self.signing_input_bytes()?)?;
        Ok(encode_proof_value(&signature))
    }
}

fn decode_hash(encoded: &str) -> Result<Vec<u8>> {
    match multibase::decode(encoded) {
        Ok((Base::Base64Url, bytes)) => Ok(bytes),
        Ok((base, _)) => Err(Error::msg(ErrorKind::TokenMismatch, format!("expected base64url hash, found {base:?}"))),
        Err(err) => Err(Error::new(ErrorKind::TokenMismatch, err)),
    }
}

/// Runs `complete` for a token at most once.
///
/// A token id is recorded before completion and released again when the
/// completion fails, so a rejected completion can be retried. Ids of expired
/// tokens are pruned, since such tokens are refused anyway.
pub(crate) fn consume_once<T>(token_id: Uuid, expires: DateTime<Utc>, complete: impl FnOnce() -> Result<T>) -> Result<T> {
    let now = Utc::now();
    CONSUMED_TOKENS.retain(|_, expiry| *expiry > now);

    if now >= expires {
        return Err(Error::msg(ErrorKind::TokenMismatch, format!("token {token_id} expired at {expires}")));
    }

    match CONSUMED_TOKENS.entry(token_id) {
        Entry::Occupied(_) => {
            return Err(Error::msg(
                ErrorKind::TokenAlreadyConsumed,
                format!("token {token_id} was already completed"),
            ))
        }
        Entry::Vacant(entry) => {
            entry.insert(expires);
        }
    }

    let result = complete();
    if result.is_err() {
        CONSUMED_TOKENS.remove(&token_id);
    }
    result
}
