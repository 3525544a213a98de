use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::methods::{
    errors::DIDResolutionError,
    jwk::method::DidJwk,
    key::method::DidKey,
    peer::method::DidPeer,
    resolution::{DIDResolutionOptions, ResolutionOutput},
    traits::{DIDMethod, DIDResolver},
    utils::did_method,
    web::{resolver::DidWeb, retry::RetryOptions},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches resolution to the resolver registered for a DID's method.
///
/// Every resolution is bounded by a timeout. Successful outputs may be
/// cached, unless the caller sets `noCache` in the resolution options.
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn DIDResolver>>,
    cache: Option<RwLock<HashMap<String, ResolutionOutput>>>,
    timeout: Duration,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
            cache: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `did:key`, `did:jwk`, `did:peer` and `did:web`.
    pub fn with_default_methods(web_retry: RetryOptions) -> Self {
        Self::new()
            .register(DidKey::new())
            .register(DidJwk::new())
            .register(DidPeer::new())
            .register(DidWeb::new().with_retry(web_retry))
    }

    /// Registers a DID method under its name, replacing any previous resolver.
    pub fn register<M: DIDMethod + 'static>(mut self, method: M) -> Self {
        let name = M::name();
        let name = name.strip_prefix("did:").unwrap_or(&name).to_string();
        self.methods.insert(name, Arc::new(method));
        self
    }

    /// Enables or disables caching of successful resolutions.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| RwLock::new(HashMap::new()));
        self
    }

    /// Sets the upper bound on a single resolution.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Names of the registered methods, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn supports(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn cached(&self, did: &str) -> Option<ResolutionOutput> {
        self.cache.as_ref().and_then(|cache| cache.read().get(did).cloned())
    }

    fn store(&self, did: &str, output: &ResolutionOutput) {
        if let Some(cache) = &self.cache {
            cache.write().insert(did.to_string(), output.clone());
        }
    }
}

#[async_trait]
impl DIDResolver for MethodRegistry {
    async fn resolve(&self, did: &str, options: &DIDResolutionOptions) -> ResolutionOutput {
        let method = match did_method(did) {
            Ok(method) => method,
            Err(err) => return ResolutionOutput::failure(err),
        };

        let Some(resolver) = self.methods.get(method) else {
            debug!("no resolver registered for did:{method}");
            return ResolutionOutput::failure(DIDResolutionError::MethodNotSupported);
        };

        let use_cache = options.no_cache != Some(true);
        if use_cache {
            if let Some(output) = self.cached(did) {
                debug!("cache hit for {did}");
                return output;
            }
        }

        match tokio::time::timeout(self.timeout, resolver.resolve(did, options)).await {
            Ok(output) => {
                if use_cache && output.error().is_none() {
                    self.store(did, &output);
                }
                output
            }
            Err(_) => {
                warn!("resolution of {did} timed out after {:?}", self.timeout);
                ResolutionOutput::failure(DIDResolutionError::InternalError)
            }
        }
    }
}
