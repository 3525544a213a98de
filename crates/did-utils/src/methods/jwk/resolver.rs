use async_trait::async_trait;
use tracing::debug;

use crate::methods::{
    jwk::method::DidJwk,
    resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
    traits::DIDResolver,
};

#[async_trait]
impl DIDResolver for DidJwk {
    /// Resolves a `did:jwk` address by decoding its embedded key.
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
