//! Expansion helpers shared by the key-based DID methods.

use multibase::Base::Base58Btc;

use crate::{
    crypto::{decode_multikey, Algorithm, Curve, DecodeMultikeyError, Ed25519KeyPair, Generate, KeyPair, PublicKeyFormat},
    didcore::{Document as DIDDocument, KeyFormat, VerificationMethod, VerificationMethodType},
    jwk::{Bytes, Jwk, Key, Okp, OkpCurves},
    ldmodel::Context,
    methods::errors::DIDResolutionError,
};

pub(crate) const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

impl From<DecodeMultikeyError> for DIDResolutionError {
    fn from(err: DecodeMultikeyError) -> Self {
        match err {
            DecodeMultikeyError::MultibaseDecodeError | DecodeMultikeyError::NotBase58BtcEncoded => DIDResolutionError::InvalidDid,
            DecodeMultikeyError::ErrorIdentifyingAlgorithm => DIDResolutionError::UnsupportedPublicKeyType,
            DecodeMultikeyError::AssertionFailedOnPubKeyLength(_) => DIDResolutionError::InvalidPublicKeyLength,
        }
    }
}

/// Multikey encoding of raw public key bytes.
pub(crate) fn encode_multikey(alg: Algorithm, bytes: &[u8]) -> String {
    multibase::encode(Base58Btc, [&alg.multicodec_prefix()[..], bytes].concat())
}

/// Public JWK for raw public key bytes of the given algorithm.
///
/// Elliptic-curve points are decompressed, which also validates them.
pub(crate) fn public_jwk(alg: Algorithm, bytes: &[u8]) -> Result<Jwk, DIDResolutionError> {
    match Curve::from_algorithm(alg) {
        Some(curve) => KeyPair::from_public_key(curve, bytes)
            .and_then(|keypair| keypair.to_jwk(false))
            .map_err(|_| DIDResolutionError::InvalidPublicKey),
        None => Ok(Jwk::from(Key::Okp(Okp {
            crv: OkpCurves::X25519,
            x: Bytes::from(bytes),
            d: None,
        }))),
    }
}

/// Builds the verification method `<did>#<multikey>` for raw key bytes.
pub(crate) fn multikey_verification_method(
    did: &str,
    multikey: &str,
    alg: Algorithm,
    bytes: &[u8],
    format: PublicKeyFormat,
) -> Result<VerificationMethod, DIDResolutionError> {
    let public_key = match format {
        PublicKeyFormat::Multikey => {
            // Reject points that are not on the curve even when the key is kept encoded.
            if let Some(curve) = Curve::from_algorithm(alg) {
                KeyPair::from_public_key(curve, bytes).map_err(|_| DIDResolutionError::InvalidPublicKey)?;
            }
            KeyFormat::Multibase(multikey.to_string())
        }
        PublicKeyFormat::Jwk => KeyFormat::Jwk(Box::new(public_jwk(alg, bytes)?)),
    };

    Ok(VerificationMethod::new(
        &format!("{did}#{multikey}"),
        format.verification_method_type(),
        did,
        public_key,
    ))
}

/// Expands a DID whose method-specific part is a multikey into a DID document.
///
/// Signing keys back every relationship but `keyAgreement`. Ed25519 keys get
/// a derived X25519 key agreement method; X25519 keys only back `keyAgreement`.
pub(crate) fn expand_multikey_did(did: &str, multikey: &str, format: PublicKeyFormat) -> Result<DIDDocument, DIDResolutionError> {
    let (alg, bytes) = decode_multikey(multikey)?;
    let vm = multikey_verification_method(did, multikey, alg, &bytes, format)?;
    let reference = || Some(vec![VerificationMethodType::Reference(vm.id.clone())]);

    let mut diddoc = DIDDocument::new(Context::from_urls(&[DID_CONTEXT, format.context()]), did);

    if alg == Algorithm::X25519 {
        diddoc.key_agreement = reference();
        diddoc.verification_method = Some(vec![vm]);
        return Ok(diddoc);
    }

    diddoc.authentication = reference();
    diddoc.assertion_method = reference();
    diddoc.capability_invocation = reference();
    diddoc.capability_delegation = reference();

    let mut methods = vec![vm];
    if alg == Algorithm::Ed25519 {
        let keypair = Ed25519KeyPair::from_public_key(&bytes).map_err(|_| DIDResolutionError::InvalidPublicKey)?;
        let x25519 = keypair.x25519_public_key().map_err(|_| DIDResolutionError::InvalidPublicKey)?;
        let enc_multikey = encode_multikey(Algorithm::X25519, &x25519);
        let enc_vm = multikey_verification_method(did, &enc_multikey, Algorithm::X25519, &x25519, format)?;

        diddoc.key_agreement = Some(vec![VerificationMethodType::Reference(enc_vm.id.clone())]);
        methods.push(enc_vm);
    }
    diddoc.verification_method = Some(methods);

    Ok(diddoc)
}
