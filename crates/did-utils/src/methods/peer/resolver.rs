use async_trait::async_trait;
use tracing::debug;

use crate::methods::{
    peer::method::DidPeer,
    resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
    traits::DIDResolver,
};

#[async_trait]
impl DIDResolver for DidPeer {
    /// Resolves a `did:peer` address to a DID document.
    ///
    /// # Example
    ///
    /// ```
    /// use did_utils::methods::{DIDResolver, DidPeer, DIDResolutionOptions};
    ///
    /// # async fn example_resolve_did_peer() {
    /// let did_peer_resolver = DidPeer::new();
    /// let did = "did:peer:0z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
    /// let output = did_peer_resolver.resolve(did, &DIDResolutionOptions::default()).await;
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
