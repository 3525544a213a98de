use crate::{
    crypto::{Algorithm, Error as CryptoError, KeyPair, PublicKeyFormat, ToMultikey},
    didcore::{Document as DIDDocument, VerificationMethod},
    methods::{
        common::{encode_multikey, expand_multikey_did},
        errors::DIDResolutionError,
        traits::DIDMethod,
    },
};

/// did:key method.
#[derive(Debug, Clone, Copy, Default)]
pub struct DidKey {
    /// Key format to consider during DID
    /// expansion into a DID document.
    key_format: PublicKeyFormat,
}

impl DIDMethod for DidKey {
    fn name() -> String {
        "did:key".to_string()
    }
}

impl DidKey {
    /// Creates new instance of DidKey.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new instance of DidKey with given key format.
    pub fn with_format(key_format: PublicKeyFormat) -> Self {
        Self { key_format }
    }

    /// Computes did:key address corresponding to a key pair
    pub fn from_keypair(keypair: &KeyPair) -> String {
        format!("did:key:{}", keypair.to_multikey())
    }

    /// Computes did:key address corresponding to raw public key bytes
    pub fn from_raw_public_key(alg: Algorithm, bytes: &[u8]) -> Result<String, CryptoError> {
        if alg.public_key_length() != bytes.len() {
            return Err(CryptoError::InvalidKeyLength);
        }

        Ok(format!("did:key:{}", encode_multikey(alg, bytes)))
    }

    /// Verification method a key pair is published under in its did:key document.
    pub fn verification_method(&self, keypair: &KeyPair) -> Result<VerificationMethod, DIDResolutionError> {
        let did = Self::from_keypair(keypair);
        self.expand(&did)?
            .verification_method
            .and_then(|methods| methods.into_iter().next())
            .ok_or(DIDResolutionError::InternalError)
    }

    /// Expands did:key address into DID document
    ///
    /// See https://w3c-ccg.github.io/did-method-key/#create
    pub fn expand(&self, did: &str) -> Result<DIDDocument, DIDResolutionError> {
        let multikey = did.strip_prefix("did:key:").ok_or(DIDResolutionError::InvalidDid)?;
        if !multikey.starts_with('z') {
            return Err(DIDResolutionError::InvalidDid);
        }

        expand_multikey_did(did, multikey, self.key_format)
    }
}
