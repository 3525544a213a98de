//! Verification of secured credentials and presentations.
//!
//! Malformed documents, unresolvable contexts and failed DID resolution
//! abort verification with an error. Everything else, bad signatures
//! included, is collected into a [`VerificationReport`].

use chrono::Utc;
use did_utils::{
    didcore::VerificationRelationship,
    ldmodel::ContextLoader,
    methods::{parse_did_url, DIDResolver},
    proof::{detach_proofs, CryptoProof, DataIntegrity, Error as ProofError, Proof},
    vc::{VerifiableCredential, VerifiablePresentation},
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    derivation::{key_from_jwk, public_key_of},
    error::Result,
    jwt,
    options::{Check, ProofOptions},
    report::VerificationReport,
    resolution::resolve_verification_method,
    token::DocumentKind,
};

/// Verifies a secured document.
///
/// For presentations, every embedded credential carrying a proof is
/// verified as well.
pub async fn verify(
    kind: DocumentKind,
    document: &Value,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    let mut report = verify_document(kind, document, options, contexts, resolver).await?;

    if kind == DocumentKind::Presentation {
        verify_embedded(document, options, contexts, resolver, &mut report).await?;
    }

    let report = report.finish();
    debug!("{kind} verified: {}", report.verified);
    Ok(report)
}

/// Verifies the credentials embedded in a presentation into its report.
///
/// Object credentials are verified when they carry a proof, string ones as
/// VC-JWTs.
pub(crate) async fn verify_embedded(
    presentation: &Value,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
    report: &mut VerificationReport,
) -> Result<()> {
    let presentation = VerifiablePresentation::from_value(presentation)?;
    let credential_options = ProofOptions {
        checks: options.checks.clone(),
        ..ProofOptions::default()
    };

    for (index, credential) in presentation.credentials().enumerate() {
        let prefix = format!("verifiableCredential[{index}]");
        let nested = match credential {
            Value::String(token) => jwt::verify_token(DocumentKind::Credential, token, &credential_options, contexts, resolver)
                .await
                .map(|(_, nested)| nested),
            _ if credential.get("proof").is_none() => continue,
            _ => verify_document(DocumentKind::Credential, credential, &credential_options, contexts, resolver).await,
        };

        let nested = nested.map_err(|err| {
            let kind = err.kind();
            err.wrap(kind, prefix.clone())
        })?;
        report.merge_nested(&prefix, nested);
    }

    Ok(())
}

pub async fn verify_credential(
    credential: &Value,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    verify(DocumentKind::Credential, credential, options, contexts, resolver).await
}

pub async fn verify_presentation(
    presentation: &Value,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    verify(DocumentKind::Presentation, presentation, options, contexts, resolver).await
}

async fn verify_document(
    kind: DocumentKind,
    document: &Value,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<VerificationReport> {
    kind.validate(document)?;
    let (_, proofs) = detach_proofs(document)?;

    let mut report = VerificationReport::new();
    let checks = options.checks();

    if checks.contains(&Check::Proof) {
        let controller = kind.controller(document)?;
        verify_proofs(kind, document, &proofs, controller.as_deref(), options, contexts, resolver, &mut report).await?;
    }

    if checks.contains(&Check::Validity) {
        match kind {
            DocumentKind::Credential => {
                let credential = VerifiableCredential::from_value(document)?;
                match credential.check_validity_period(Utc::now()) {
                    Ok(()) => report.check("validity"),
                    Err(err) => report.error(err.to_string()),
                }
            }
            DocumentKind::Presentation => report.warning("validity check only applies to credentials"),
        }
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
async fn verify_proofs(
    kind: DocumentKind,
    document: &Value,
    proofs: &[Proof],
    controller: Option<&str>,
    options: &ProofOptions,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
    report: &mut VerificationReport,
) -> Result<()> {
    if proofs.is_empty() {
        report.error(format!("{kind} has no proof"));
        return Ok(());
    }

    let purpose = options.purpose_or(kind.default_purpose());
    let mut skipped = Vec::new();
    let mut failures = 0;

    for proof in proofs {
        if let Some(reason) = mismatch(proof, options, purpose) {
            report.warning(format!("skipped proof by {}: {reason}", proof.verification_method));
            skipped.push(reason);
            continue;
        }

        if let Some(controller) = controller {
            if !is_controlled_by(&proof.verification_method, controller) {
                report.error(format!(
                    "verification method {} is not controlled by {controller}",
                    proof.verification_method
                ));
                failures += 1;
                continue;
            }
        }

        if let Err(reason) = verify_proof(proof, document, options, purpose, contexts, resolver).await? {
            warn!("proof by {} rejected: {reason}", proof.verification_method);
            report.error(reason);
            failures += 1;
        }
    }

    if skipped.len() == proofs.len() {
        report.error(format!("no applicable proof: {}", skipped.join("; ")));
    } else if failures == 0 {
        report.check("proof");
    }

    Ok(())
}

// Why a proof does not answer the verifier's request, if it does not.
fn mismatch(proof: &Proof, options: &ProofOptions, purpose: VerificationRelationship) -> Option<String> {
    if proof.proof_purpose.as_deref() != Some(purpose.as_str()) {
        return Some(format!(
            "proof purpose {} is not {purpose}",
            proof.proof_purpose.as_deref().unwrap_or("<none>")
        ));
    }

    if let Some(vm) = &options.verification_method {
        if proof.verification_method != *vm {
            return Some(format!("verification method is not {vm}"));
        }
    }

    if let Some(challenge) = &options.challenge {
        if proof.challenge.as_ref() != Some(challenge) {
            return Some("challenge does not match".to_string());
        }
    }

    if let Some(domain) = &options.domain {
        if !proof.has_domain(domain) {
            return Some(format!("domain does not include {domain}"));
        }
    }

    None
}

/// Whether a verification method belongs to the DID document of `did`.
pub(crate) fn is_controlled_by(verification_method: &str, did: &str) -> bool {
    matches!(parse_did_url(verification_method), Ok((vm_did, _, _)) if vm_did == did)
}

// The outer result carries hard errors, the inner one report errors.
async fn verify_proof(
    proof: &Proof,
    document: &Value,
    options: &ProofOptions,
    purpose: VerificationRelationship,
    contexts: &ContextLoader,
    resolver: &dyn DIDResolver,
) -> Result<std::result::Result<(), String>> {
    if let Some(expires) = proof.expires {
        if expires < Utc::now() {
            return Ok(Err(format!("proof expired at {expires}")));
        }
    }

    let key = match &options.public_key_jwk {
        Some(jwk) => key_from_jwk(&jwk.to_public())?,
        None => {
            let (did_document, vm) = resolve_verification_method(resolver, &proof.verification_method).await?;
            if !did_document.is_authorized(&vm.id, purpose) {
                return Ok(Err(format!("{} is not authorized for {purpose}", vm.id)));
            }
            public_key_of(&vm)?
        }
    };

    match DataIntegrity::new(proof.clone(), key, contexts).verify(document) {
        Ok(()) => {
            debug!("proof by {} verified", proof.verification_method);
            Ok(Ok(()))
        }
        Err(ProofError::InvalidSignature) => Ok(Err("signature verification failed".to_string())),
        Err(ProofError::InvalidProofValue(reason)) => Ok(Err(format!("invalid proofValue: {reason}"))),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use did_utils::{
        crypto::{Curve, KeyPair},
        methods::{MethodRegistry, RetryOptions},
    };
    use serde_json::json;

    use crate::{
        derivation::{key_to_did, key_to_jwk, key_to_verification_method, MethodPattern},
        error::ErrorKind,
        issuer::{issue_credential, issue_presentation},
    };

    fn registry() -> MethodRegistry {
        MethodRegistry::with_default_methods(RetryOptions::new())
    }

    fn credential(issuer: &str) -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1", "https://www.w3.org/2018/credentials/examples/v1"],
            "id": "http://example.edu/credentials/1872",
            "type": ["VerifiableCredential", "AlumniCredential"],
            "issuer": issuer,
            "issuanceDate": "2010-01-01T19:23:24Z",
            "credentialSubject": {
                "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
                "alumniOf": "Example University"
            }
        })
    }

    fn signed_credential(curve: Curve) -> (KeyPair, Value) {
        let key = KeyPair::generate(curve).unwrap();
        let did = key_to_did(MethodPattern::Key, &key).unwrap();
        let signed = issue_credential(&credential(&did), &ProofOptions::default(), &key, &ContextLoader::new()).unwrap();
        (key, signed)
    }

    #[tokio::test]
    async fn test_round_trip_on_every_curve() {
        for curve in Curve::ALL {
            let (_, signed) = signed_credential(curve);
            let report = verify_credential(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
                .await
                .unwrap();

            assert!(report.verified, "{curve}: {:?}", report.errors);
            assert_eq!(report.checks, vec!["proof"]);
        }
    }

    #[tokio::test]
    async fn test_tampering_is_reported() {
        let (_, mut signed) = signed_credential(Curve::Ed25519);
        signed["credentialSubject"]["alumniOf"] = json!("Forged University");

        let report = verify_credential(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();

        assert!(!report.verified);
        assert_eq!(report.errors, vec!["signature verification failed"]);
    }

    #[tokio::test]
    async fn test_proof_filters() {
        let (_, signed) = signed_credential(Curve::P256);

        let options = ProofOptions {
            proof_purpose: Some(VerificationRelationship::Authentication),
            ..ProofOptions::default()
        };
        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(!report.verified);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.errors[0].starts_with("no applicable proof"));

        let options = ProofOptions {
            challenge: Some("expected-challenge".to_string()),
            ..ProofOptions::default()
        };
        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(report.errors[0].contains("challenge does not match"));
    }

    #[tokio::test]
    async fn test_supplied_key_takes_precedence() {
        let (key, signed) = signed_credential(Curve::Secp256k1);

        let options = ProofOptions {
            public_key_jwk: Some(key_to_jwk(&key, false).unwrap()),
            ..ProofOptions::default()
        };
        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(report.verified);

        let other = KeyPair::generate(Curve::Secp256k1).unwrap();
        let options = ProofOptions {
            public_key_jwk: Some(key_to_jwk(&other, false).unwrap()),
            ..ProofOptions::default()
        };
        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(!report.verified);
    }

    #[tokio::test]
    async fn test_validity_check() {
        let key = KeyPair::generate(Curve::Ed25519).unwrap();
        let did = key_to_did(MethodPattern::Key, &key).unwrap();

        let mut expired = credential(&did);
        expired["expirationDate"] = json!((Utc::now() - Duration::days(1)).to_rfc3339());
        let signed = issue_credential(&expired, &ProofOptions::default(), &key, &ContextLoader::new()).unwrap();

        let options = ProofOptions {
            checks: Some(vec![Check::Proof, Check::Validity]),
            ..ProofOptions::default()
        };
        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();

        assert!(!report.verified);
        assert_eq!(report.checks, vec!["proof"]);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_proof_is_reported() {
        let key = KeyPair::generate(Curve::Ed25519).unwrap();
        let did = key_to_did(MethodPattern::Key, &key).unwrap();
        let options = ProofOptions {
            expires: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..ProofOptions::default()
        };
        let signed = issue_credential(&credential(&did), &options, &key, &ContextLoader::new()).unwrap();

        let report = verify_credential(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();
        assert!(report.errors[0].starts_with("proof expired"));
    }

    #[tokio::test]
    async fn test_unauthorized_purpose_is_reported() {
        let key = KeyPair::generate(Curve::Ed25519).unwrap();
        let did = key_to_did(MethodPattern::Key, &key).unwrap();
        let options = ProofOptions {
            proof_purpose: Some(VerificationRelationship::KeyAgreement),
            ..ProofOptions::default()
        };
        let signed = issue_credential(&credential(&did), &options, &key, &ContextLoader::new()).unwrap();

        let report = verify_credential(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(report.errors[0].contains("is not authorized for keyAgreement"));
    }

    #[tokio::test]
    async fn test_presentation_reports_embedded_credentials() {
        let (_, good) = signed_credential(Curve::P384);
        let (_, mut forged) = signed_credential(Curve::Ed25519);
        forged["issuanceDate"] = json!("2011-01-01T19:23:24Z");

        let holder = KeyPair::generate(Curve::Ed25519).unwrap();
        let holder_did = key_to_did(MethodPattern::Key, &holder).unwrap();
        let presentation = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiablePresentation"],
            "holder": holder_did,
            "verifiableCredential": [good, forged]
        });
        let options = ProofOptions {
            challenge: Some("1f44d55f".to_string()),
            ..ProofOptions::default()
        };
        let signed = issue_presentation(&presentation, &options, &holder, &ContextLoader::new()).unwrap();

        let report = verify_presentation(&signed, &options, &ContextLoader::new(), &registry()).await.unwrap();
        assert!(!report.verified);
        assert_eq!(report.checks, vec!["proof"]);
        assert_eq!(report.errors, vec!["verifiableCredential[1]: signature verification failed"]);
    }

    #[tokio::test]
    async fn test_unsigned_and_unresolvable() {
        let key = KeyPair::generate(Curve::Ed25519).unwrap();
        let did = key_to_did(MethodPattern::Key, &key).unwrap();

        let report = verify_credential(&credential(&did), &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();
        assert_eq!(report.errors, vec!["credential has no proof"]);

        let (_, mut signed) = signed_credential(Curve::Ed25519);
        signed["issuer"] = json!("did:example:issuer");
        signed["proof"]["verificationMethod"] = json!("did:example:issuer#key-1");
        let err = verify_credential(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MethodNotSupported);
    }

    #[tokio::test]
    async fn test_proofs_must_come_from_the_issuer() {
        let issuer = KeyPair::generate(Curve::Ed25519).unwrap();
        let issuer_did = key_to_did(MethodPattern::Key, &issuer).unwrap();

        let attacker = KeyPair::generate(Curve::Ed25519).unwrap();
        let options = ProofOptions {
            verification_method: Some(key_to_verification_method(MethodPattern::Key, &attacker).unwrap().id),
            ..ProofOptions::default()
        };
        let forged = issue_credential(&credential(&issuer_did), &options, &attacker, &ContextLoader::new()).unwrap();

        let report = verify_credential(&forged, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();
        assert!(!report.verified);
        assert!(report.errors[0].ends_with(&format!("is not controlled by {issuer_did}")), "{:?}", report.errors);
        assert!(report.checks.is_empty());

        assert!(is_controlled_by(&format!("{issuer_did}#key-1"), &issuer_did));
        assert!(!is_controlled_by("not a did url", &issuer_did));
    }

    #[tokio::test]
    async fn test_presentations_are_bound_to_their_holder() {
        let holder = KeyPair::generate(Curve::P256).unwrap();
        let holder_did = key_to_did(MethodPattern::Jwk, &holder).unwrap();
        let other = KeyPair::generate(Curve::P256).unwrap();

        let presentation = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiablePresentation"],
            "holder": holder_did,
        });
        let options = ProofOptions {
            verification_method: Some(key_to_verification_method(MethodPattern::Key, &other).unwrap().id),
            ..ProofOptions::default()
        };
        let signed = issue_presentation(&presentation, &options, &other, &ContextLoader::new()).unwrap();

        let report = verify_presentation(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();
        assert!(!report.verified);

        // Without a holder any resolvable signer is accepted
        let mut anonymous = presentation.clone();
        anonymous.as_object_mut().unwrap().remove("holder");
        let signed = issue_presentation(&anonymous, &ProofOptions::default(), &other, &ContextLoader::new()).unwrap();
        let report = verify_presentation(&signed, &ProofOptions::default(), &ContextLoader::new(), &registry())
            .await
            .unwrap();
        assert!(report.verified, "{:?}", report.errors);
    }
}
