use did_utils::{
    didcore::{Document, VerificationMethod},
    methods::{parse_did_url, Content, DIDResolutionError, DIDResolutionOptions, DIDResolver, ResolutionOutput},
};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Resolves a DID into its document and metadata.
///
/// The returned output always carries a DID document.
pub async fn resolve_did(
    resolver: &dyn DIDResolver,
    did: &str,
    options: &DIDResolutionOptions,
) -> Result<ResolutionOutput> {
    debug!("resolving {did}");
    let output = resolver.resolve(did, options).await;

    if let Some(err) = output.error() {
        return Err(Error::from(err.clone()).wrap_resolution(did));
    }
    if output.did_document.is_none() {
        return Err(Error::msg(ErrorKind::Resolution, format!("resolution of {did} returned no document")));
    }

    Ok(output)
}

/// Resolves a DID into its document.
pub async fn resolve_document(resolver: &dyn DIDResolver, did: &str, options: &DIDResolutionOptions) -> Result<Document> {
    resolve_did(resolver, did, options)
        .await?
        .did_document
        .ok_or_else(|| Error::msg(ErrorKind::Resolution, format!("resolution of {did} returned no document")))
}

/// Dereferences a DID URL into the resource it points at.
pub async fn dereference_did_url(
    resolver: &dyn DIDResolver,
    did_url: &str,
    options: &DIDResolutionOptions,
) -> Result<Content> {
    debug!("dereferencing {did_url}");
    let output = resolver.dereference(did_url, options).await;

    if let Some(err) = output.error() {
        let kind = match err {
            DIDResolutionError::NotFound => ErrorKind::Dereference,
            DIDResolutionError::InvalidDid | DIDResolutionError::InvalidDidUrl => ErrorKind::MalformedInput,
            DIDResolutionError::MethodNotSupported => ErrorKind::MethodNotSupported,
            _ => ErrorKind::Resolution,
        };
        return Err(Error::new(kind, err.clone()).wrap(kind, format!("could not dereference {did_url}")));
    }

    output
        .content
        .ok_or_else(|| Error::msg(ErrorKind::Dereference, format!("nothing found at {did_url}")))
}

/// Resolves the DID document a verification method belongs to, and the method itself.
pub async fn resolve_verification_method(
    resolver: &dyn DIDResolver,
    vm_id: &str,
) -> Result<(Document, VerificationMethod)> {
    let (did, _, _) = parse_did_url(vm_id).map_err(|err| {
        Error::new(ErrorKind::MalformedInput, err).wrap(ErrorKind::MalformedInput, format!("verification method {vm_id:?}"))
    })?;

    let document = resolve_document(resolver, &did, &DIDResolutionOptions::default()).await?;
    let vm = document.find_verification_method(vm_id).ok_or_else(|| {
        Error::msg(
            ErrorKind::Dereference,
            format!("verification method {vm_id} not found in the DID document of {did}"),
        )
    })?;

    Ok((document, vm))
}

impl Error {
    fn wrap_resolution(self, did: &str) -> Self {
        let kind = self.kind();
        self.wrap(kind, format!("could not resolve {did}"))
    }
}
