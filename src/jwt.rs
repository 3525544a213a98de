//! Credentials and presentations secured as compact JWS (VC-JWT).
//!
//! The document travels unchanged in the `vc` or `vp` claim. Registered
//! claims mirror its issuer or holder, subject, id and validity, and the
//! `kid` header names the verification method of the signing key.

use chrono::{DateTime, SubsecRound, Utc};
use did_utils::{
    crypto::{CoreSign, Curve},
    ldmodel::ContextLoader,
    methods::DIDResolver,
    vc::{VerifiableCredential, VerifiablePresentation},
};
use multibase::Base::Base64Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    derivation::{key_from_jwk, public_key_of},
    error::{Error, ErrorKind, Result},
    issuer::default_verification_method,
    options::{Check, ProofOptions},
    report::VerificationReport,
    resolution::resolve_verification_method,
    token::DocumentKind,
    verifier::{is_controlled_by, verify_embedded},
    KeyPair,
};

/// JWS algorithm of signatures made with a key on `curve`.
pub fn algorithm(curve: Curve) -> &'static str {
    match curve {
        Curve::Ed25519 => "EdDSA",
        Curve::P256 => "ES256",
        Curve::Secp256k1 => "ES256K",
        Curve::P384 => "ES384",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// A single audience or an array of them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vc: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vp: Option<Value>,
}

impl Claims {
    fn new(kind: DocumentKind, document: &Value, options: &ProofOptions) -> Result<Self> {
        let claims = match kind {
            DocumentKind::Credential => {
                let credential = VerifiableCredential::from_value(document)?;
                Claims {
                    iss: Some(credential.issuer.id().to_string()),
                    sub: credential.credential_subject.iter().find_map(|subject| subject.id.clone()),
                    jti: credential.id.clone(),
                    nbf: credential.valid_from().map(|from| from.timestamp()),
                    exp: credential.valid_until().map(|until| until.timestamp()),
                    vc: Some(document.clone()),
                    ..Claims::default()
                }
            }
            DocumentKind::Presentation => {
                let presentation = VerifiablePresentation::from_value(document)?;
                let issued = options.created.unwrap_or_else(|| Utc::now().trunc_subsecs(0));
                Claims {
                    iss: presentation.holder.as_ref().map(|holder| holder.id().to_string()),
                    jti: presentation.id.clone(),
                    aud: options.domain.clone().map(Value::String),
                    nonce: options.challenge.clone(),
                    nbf: Some(issued.timestamp()),
                    exp: options.expires.map(|expires| expires.timestamp()),
                    vp: Some(document.clone()),
                    ..Claims::default()
                }
            }
        };
        Ok(claims)
    }

    fn audience_includes(&self, domain: &str) -> bool {
        match &self.aud {
            Some(Value::String(aud)) => aud == domain,
            Some(Value::Array(auds)) => auds.iter().any(|aud| aud.as_str() == Some(domain)),
            _ => false,
        }
    }
}

/// A decoded compact JWS.
#[derive(Debug)]
pub struct Jwt {
    pub header: Header,
    pub claims: Claims,
    signing_input: String,
    signature: Vec<u8>,
}

impl Jwt {
    /// Splits and decodes a compact JWS, without checking its signature.
    pub fn decode(jwt: &str) -> Result<Self> {
        let mut parts = jwt.trim().split('.');
        let (Some(header), Some(claims), Some(signature), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::msg(ErrorKind::MalformedInput, "a JWT has exactly three parts"));
        };

        Ok(Self {
            header: decode_part(header)?,
            claims: decode_part(claims)?,
            signing_input: format!("{header}.{claims}"),
            signature: Base64Url.decode(signature).map_err(|err| {
                Error::new(ErrorKind::MalformedInput, err).wrap(ErrorKind::MalformedInput, "invalid JWT signature")
            })?,
        })
    }

    /// The credential or presentation the token carries.
    pub fn document(&self, kind: DocumentKind) -> Result<Value> {
        let (claim, document) = match kind {
            DocumentKind::Credential => ("vc", &self.claims.vc),
            DocumentKind::Presentation => ("vp", &self.claims.vp),
        };
        document
            .clone()
            .filter(Value::is_object)
            .ok_or_else(|| Error::msg(ErrorKind::MalformedInput, format!("JWT has no {claim} claim holding a {kind}")))
    }
}

/// Signs a document with a local key into a VC-JWT.
pub fn issue(
    kind: DocumentKind,
    document: &Value,
    options: &ProofOptions,
    key: &KeyPair,
    contexts: &ContextLoader,
) -> Result<String> {
    kind.validate(document)?;
    contexts.resolve_document(document)?;

    if !key.has_secret() {
        return Err(Error::msg(
            ErrorKind::MissingPrivateKey,
            format!("a private key is needed to issue a {kind}"),
        ));
    }
    if let Some(cryptosuite) = &options.cryptosuite {
        warn!("cryptosuite {cryptosuite} does not apply to JWT proofs, ignoring it");
    }

    let verification_method = match &options.verification_method {
        Some(vm) => vm.clone(),
        None => default_verification_method(kind, document, key)?,
    };
    let alg = algorithm(key.curve());
    let header = Header {
        alg: alg.to_string(),
        kid: Some(verification_method.clone()),
        typ: Some("JWT".to_string()),
    };
    let claims = Claims::new(kind, document, options)?;

    let signing_input = format!("{}.{}", encode_part(&header)?, encode_part(&claims)?);
    let signature = key
        .sign(signing_input.as_bytes())
        .map_err(|err| Error::from(err).wrap(ErrorKind::Issuance, format!("could not sign {kind}")))?;

    info!("issued {kind} as {alg} JWT by {verification_method}");
    Ok(format!("{signing_input}.{}", Base64Url.encode(signature)))
}

pub fn issue_credential(credential: &Value, options: &ProofOptions, key: &KeyPair, contexts: &ContextLoader) -> Result<String> {
    issue(DocumentKind::Credential, credential, options, key, contexts)
}

pub fn issue_presentation(presentation: &Value, options: &ProofOptions, key: &KeyPair, contexts: &ContextLoader) -> Result<String> {
    issue(DocumentKind::Presentation, presentation, options, key, contexts)
}

/// Verifies a VC-JWT.
///
/// As for embedded proofs, a token that cannot be decoded aborts
/// verification while a bad signature is reported. Credentials embedded in
/// a presentation are verified as well.
pub async fn verify(
    kind: DocumentKind,
    jwt: &str,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    let (document, mut report) = verify_token(kind, jwt, options, contexts, resolver).await?;

    if kind == DocumentKind::Presentation {
        verify_embedded(&document, options, contexts, resolver, &mut report).await?;
    }

    let report = report.finish();
    debug!("{kind} JWT verified: {}", report.verified);
    Ok(report)
}

pub async fn verify_credential(
    jwt: &str,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    verify(DocumentKind::Credential, jwt, options, contexts, resolver).await
}

pub async fn verify_presentation(
    jwt: &str,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    verify(DocumentKind::Presentation, jwt, options, contexts, resolver).await
}

/// Verifies a single token, leaving the report open for nested documents.
pub(crate) async fn verify_token(
    kind: DocumentKind,
    jwt: &str,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<(Value, VerificationReport)> {
    let token = Jwt::decode(jwt)?;
    let document = token.document(kind)?;
    kind.validate(&document)?;
    contexts.resolve_document(&document)?;

    let mut report = VerificationReport::new();
    let checks = options.checks();

    if checks.contains(&Check::Proof) {
        match verify_signature(kind, &token, &document, options, resolver).await? {
            Ok(()) => report.check("proof"),
            Err(reason) => {
                warn!("{kind} JWT by {} rejected: {reason}", token.header.kid.as_deref().unwrap_or("<no kid>"));
                report.error(reason);
            }
        }
    }

    if checks.contains(&Check::Validity) {
        let now = Utc::now();
        let errors = report.errors.len();

        if let Some(nbf) = token.claims.nbf.and_then(|nbf| DateTime::from_timestamp(nbf, 0)) {
            if now < nbf {
                report.error(format!("token is not valid before {nbf}"));
            }
        }
        if let Some(exp) = token.claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)) {
            if now > exp {
                report.error(format!("token expired at {exp}"));
            }
        }
        if kind == DocumentKind::Credential {
            if let Err(err) = VerifiableCredential::from_value(&document)?.check_validity_period(now) {
                report.error(err.to_string());
            }
        }

        if report.errors.len() == errors {
            report.check("validity");
        }
    }

    Ok((document, report))
}

// The outer result carries hard errors, the inner one report errors.
async fn verify_signature(
    kind: DocumentKind,
    token: &Jwt,
    document: &Value,
    options: &ProofOptions,
    resolver: &dyn DIDResolver,
) -> Result<std::result::Result<(), String>> {
    let Some(kid) = &token.header.kid else {
        return Ok(Err("JWT header has no kid".to_string()));
    };
    let claims = &token.claims;

    let controller = kind.controller(document)?;
    match (&controller, &claims.iss) {
        (Some(controller), Some(iss)) if controller != iss => {
            return Ok(Err(format!("iss {iss} does not match {controller}")));
        }
        (Some(_), None) if kind == DocumentKind::Credential => {
            return Ok(Err("JWT has no iss claim".to_string()));
        }
        _ => {}
    }
    if let Some(signer) = controller.as_deref().or(claims.iss.as_deref()) {
        if !is_controlled_by(kid, signer) {
            return Ok(Err(format!("verification method {kid} is not controlled by {signer}")));
        }
    }

    if let Some(vm) = &options.verification_method {
        if kid != vm {
            return Ok(Err(format!("verification method is not {vm}")));
        }
    }
    if let Some(challenge) = &options.challenge {
        if claims.nonce.as_ref() != Some(challenge) {
            return Ok(Err("nonce does not match the challenge".to_string()));
        }
    }
    if let Some(domain) = &options.domain {
        if !claims.audience_includes(domain) {
            return Ok(Err(format!("aud does not include {domain}")));
        }
    }

    let key = match &options.public_key_jwk {
        Some(jwk) => key_from_jwk(&jwk.to_public())?,
        None => {
            let purpose = options.purpose_or(kind.default_purpose());
            let (did_document, vm) = resolve_verification_method(resolver, kid).await?;
            if !did_document.is_authorized(&vm.id, purpose) {
                return Ok(Err(format!("{} is not authorized for {purpose}", vm.id)));
            }
            public_key_of(&vm)?
        }
    };

    let alg = algorithm(key.curve());
    if token.header.alg != alg {
        return Ok(Err(format!("alg {} does not match the {alg} key of {kid}", token.header.alg)));
    }

    match key.verify(token.signing_input.as_bytes(), &token.signature) {
        Ok(()) => {
            debug!("JWT by {kid} verified");
            Ok(Ok(()))
        }
        Err(_) => Ok(Err("signature verification failed".to_string())),
    }
}

fn encode_part<T: Serialize>(part: &T) -> Result<String> {
    let json = serde_json::to_vec(part).map_err(|err| Error::new(ErrorKind::Internal, err))?;
    Ok(Base64Url.encode(json))
}

fn decode_part<T: DeserializeOwned>(part: &str) -> Result<T> {
    let bytes = Base64Url
        .decode(part)
        .map_err(|err| Error::new(ErrorKind::MalformedInput, err).wrap(ErrorKind::MalformedInput, "invalid JWT part"))?;
    Ok(serde_json::from_slice(&bytes)?)
}
