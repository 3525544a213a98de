use async_trait::async_trait;
use tracing::debug;

use crate::methods::{
    key::method::DidKey,
    resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
    traits::DIDResolver,
};

#[async_trait]
impl DIDResolver for DidKey {
    /// Resolves a `did:key` address by expanding it into its DID document.
    ///
    /// # Example
    ///
    /// ```
    /// use did_utils::methods::{DIDResolver, DidKey, DIDResolutionOptions};
    ///
    /// # async fn example_resolve_did_key() {
    /// let did_key_resolver = DidKey::new();
    /// let did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
    /// let output = did_key_resolver.resolve(did, &DIDResolutionOptions::default()).await;
    /// # }
    /// ```
    async fn resolve(&self, did: &str, _options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.expand(did) {
            Ok(diddoc) => ResolutionOutput::success(diddoc, MediaType::DidLdJson),
            Err(err) => {
                debug!("failed to expand {did}: {err}");
                ResolutionOutput::failure(err)
            }
        }
    }
}
