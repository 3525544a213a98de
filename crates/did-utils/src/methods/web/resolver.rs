use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    http::uri::{self, Scheme},
    Uri,
};
use hyper_tls::HttpsConnector;
use hyper_util::{
    client::legacy::{
        connect::{Connect, HttpConnector},
        Client,
    },
    rt::TokioExecutor,
};
use tracing::{debug, warn};

use super::retry::{retry_async, RetryOptions};
use crate::didcore::Document as DIDDocument;
use crate::methods::{
    errors::{DIDResolutionError, DidWebError},
    resolution::{DIDResolutionOptions, MediaType, ResolutionOutput},
    traits::{DIDMethod, DIDResolver},
};

/// A struct for resolving DID Web documents.
pub struct DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    client: Client<C, Full<Bytes>>,
    retry: RetryOptions,
}

impl DidWeb<HttpConnector> {
    // Creates a new `DidWeb` resolver with HTTP scheme, for testing only.
    #[cfg(test)]
    pub fn http() -> DidWeb<HttpConnector> {
        DidWeb {
            client: Client::builder(TokioExecutor::new()).build_http(),
            retry: RetryOptions::new().retries(0),
        }
    }
}

impl Default for DidWeb<HttpsConnector<HttpConnector>> {
    fn default() -> Self {
        Self::new()
    }
}

impl DidWeb<HttpsConnector<HttpConnector>> {
    /// Creates a new `DidWeb` resolver.
    pub fn new() -> DidWeb<HttpsConnector<HttpConnector>> {
        DidWeb {
            client: Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(HttpsConnector::new()),
            retry: RetryOptions::new(),
        }
    }
}

impl<C> DIDMethod for DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    fn name() -> String {
        "did:web".to_string()
    }
}

impl<C> DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    /// Overrides the retry policy applied to transient fetch failures.
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches a DID document from the given URL
    async fn fetch_did_document(&self, url: Uri) -> Result<String, DidWebError> {
        let res = self.client.get(url).await?;

        if !res.status().is_success() {
            return Err(DidWebError::NonSuccessResponse(res.status()));
        }

        let body = BodyExt::collect(res.into_body()).await?;

        String::from_utf8(body.to_bytes().to_vec()).map_err(|err| err.into())
    }

    /// Fetches and parses a DID document for the given DID.
    async fn resolver_fetcher(&self, did: &str) -> Result<DIDDocument, DidWebError> {
        let (path, domain_name) = parse_did_web_url(did)?;

        // Plain HTTP is only used for local development hosts.
        let scheme = if domain_name.starts_with("localhost") || domain_name.starts_with("127.0.0.1") {
            Scheme::HTTP
        } else {
            Scheme::HTTPS
        };

        let url = uri::Builder::new()
            .scheme(scheme)
            .authority(domain_name)
            .path_and_query(path)
            .build()
            .map_err(|err| DidWebError::InvalidDid(err.to_string()))?;

        debug!("fetching {did} from {url}");

        let this = self;
        let json_string = retry_async(move || this.fetch_did_document(url.clone()), self.retry, DidWebError::is_transient).await?;

        let did_document: DIDDocument = serde_json::from_str(&json_string)?;
        if did_document.id != did {
            return Err(DidWebError::RepresentationNotSupported(format!(
                "document id {} does not match {did}",
                did_document.id
            )));
        }

        Ok(did_document)
    }
}

/// Parses a DID Web URL and returns the path and domain name.
pub fn parse_did_web_url(did: &str) -> Result<(String, String), DidWebError> {
    let mut parts = did.split(':').peekable();
    let domain_name = match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some("web"), Some(domain_name)) if !domain_name.is_empty() => domain_name.replacen("%3A", ":", 1),
        (Some("did"), Some(method), _) if method != "web" => {
            return Err(DidWebError::MethodNotSupported(method.to_string()));
        }
        _ => {
            return Err(DidWebError::InvalidDid("Invalid DID".to_string()));
        }
    };

    let mut path = match parts.peek() {
        Some(_) => parts.collect::<Vec<&str>>().join("/"),
        None => ".well-known".to_string(),
    };

    path = format!("/{path}/did.json");

    Ok((path, domain_name))
}

#[async_trait]
impl<C> DIDResolver for DidWeb<C>
where
    C: Connect + Send + Sync + Clone + 'static,
{
    /// Resolves a `did:web` address to a DID document.
    ///
    /// # Example
    ///
    /// ```
    /// use did_utils::methods::{DIDResolver, DidWeb, DIDResolutionOptions};
    ///
    /// # async fn example_resolve_did_web() {
    /// // create new web did resolver
    /// let did_web_resolver = DidWeb::new();
    /// let did = "did:web:example.com";
    /// // resolve the did
    /// let output = did_web_resolver.resolve(did, &DIDResolutionOptions::default()).await;
    /// # }
    /// ```
    async fn resolve(&self, did: &str, _options: &DIDResolutionOptions) -> ResolutionOutput {
        match self.resolver_fetcher(did).await {
            Ok(diddoc) => ResolutionOutput::success(diddoc, MediaType::DidLdJson),
            Err(err) => {
                warn!("failed to resolve {did}: {err}");
                ResolutionOutput::failure(DIDResolutionError::from(&err))
            }
        }
    }
}
