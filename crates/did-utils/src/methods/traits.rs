//! Trait definitions for DID methods.

use async_trait::async_trait;

use crate::methods::{
    errors::DIDResolutionError,
    resolution::{dereference_did_document, Content, DIDResolutionOptions, DereferencingMetadata, DereferencingOptions, DereferencingOutput, MediaType, ResolutionOutput},
    utils::parse_did_url,
};
use crate::ldmodel::Context;

/// Abstract contract for DID methods.
///
/// DID methods differ too much in how they create, update or deactivate
/// identifiers for a richer common interface to pay off, so it only
/// names the method and exposes its resolver.
pub trait DIDMethod: DIDResolver {
    /// Returns the DIDMethod's registered name, prefixed with `did:`,
    /// e.g. did:key, did:web, etc.
    fn name() -> String
    where
        Self: Sized;

    /// Extracts the supertrait resolver object.
    fn resolver(&self) -> &dyn DIDResolver
    where
        Self: Sized,
    {
        self
    }
}

/// Abstract contract for DID resolution.
///
/// [See DID Resolution Specification](https://w3c.github.io/did-resolution)
#[async_trait]
pub trait DIDResolver: Send + Sync {
    /// Resolves a DID address into its corresponding DID document.
    async fn resolve(&self, did: &str, options: &DIDResolutionOptions) -> ResolutionOutput;

    /// Dereferences a DID URL into its corresponding resource.
    async fn dereference(&self, did_url: &str, options: &DereferencingOptions) -> DereferencingOutput {
        let Ok((did, query, fragment)) = parse_did_url(did_url) else {
            return DereferencingOutput::failure(DIDResolutionError::InvalidDidUrl);
        };

        let resolution_output = self.resolve(&did, options).await;
        if let Some(err) = resolution_output.error() {
            return DereferencingOutput::failure(match err {
                DIDResolutionError::InvalidDid => DIDResolutionError::InvalidDidUrl,
                other => other.clone(),
            });
        }

        let Some(diddoc) = &resolution_output.did_document else {
            return DereferencingOutput::failure(DIDResolutionError::InternalError);
        };

        match dereference_did_document(diddoc, &query, &fragment) {
            Ok(content) => {
                let content_type = match content {
                    Content::DIDDocument(_) => resolution_output
                        .did_resolution_metadata
                        .as_ref()
                        .and_then(|metadata| metadata.content_type.clone()),
                    _ => Some(MediaType::Json.to_string()),
                };

                DereferencingOutput {
                    context: Context::SingleString(String::from("https://www.w3.org/ns/did/v1")),
                    content: Some(content),
                    dereferencing_metadata: Some(DereferencingMetadata {
                        error: None,
                        content_type,
                        additional_properties: None,
                    }),
                    content_metadata: resolution_output.did_document_metadata.clone(),
                    additional_properties: None,
                }
            }
            Err(err) => DereferencingOutput::failure(err),
        }
    }
}
