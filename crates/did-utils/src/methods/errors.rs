use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry for [error] types found across the DID core specification,
/// and especially during the DID resolution process.
///
/// [error]: https://www.w3.org/TR/did-spec-registries/#error
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Error)]
#[serde(rename_all = "camelCase")]
pub enum DIDResolutionError {
    #[error("invalidDid")]
    InvalidDid,
    #[error("invalidDidUrl")]
    InvalidDidUrl,
    #[error("notFound")]
    NotFound,
    #[error("representationNotSupported")]
    RepresentationNotSupported,
    #[error("methodNotSupported")]
    MethodNotSupported,
    #[error("internalError")]
    InternalError,
    #[error("invalidPublicKey")]
    InvalidPublicKey,
    #[error("invalidPublicKeyLength")]
    InvalidPublicKeyLength,
    #[error("unsupportedPublicKeyType")]
    UnsupportedPublicKeyType,
    #[error("notAllowedLocalDuplicateKey")]
    NotAllowedLocalDuplicateKey,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DidWebError {
    #[error("DID method not supported: {0}")]
    MethodNotSupported(String),
    #[error("Representation not supported: {0}")]
    RepresentationNotSupported(String),
    #[error("Invalid DID: {0}")]
    InvalidDid(String),
    #[error("Parsing error: {0}")]
    ParsingError(#[from] ParsingErrorSource),
    #[error("HTTP error: {0}")]
    HttpError(#[from] hyper::Error),
    #[error("Client error: {0}")]
    ClientError(#[from] hyper_util::client::legacy::Error),
    #[error("Non-success server response: {0}")]
    NonSuccessResponse(StatusCode),
}

impl DidWebError {
    /// Whether retrying the request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DidWebError::HttpError(_) | DidWebError::ClientError(_) => true,
            DidWebError::NonSuccessResponse(status) => status.is_server_error(),
            _ => false,
        }
    }
}

impl From<&DidWebError> for DIDResolutionError {
    fn from(error: &DidWebError) -> Self {
        match error {
            DidWebError::MethodNotSupported(_) => DIDResolutionError::MethodNotSupported,
            DidWebError::InvalidDid(_) => DIDResolutionError::InvalidDid,
            DidWebError::RepresentationNotSupported(_) | DidWebError::ParsingError(_) => {
                DIDResolutionError::RepresentationNotSupported
            }
            DidWebError::NonSuccessResponse(StatusCode::NOT_FOUND | StatusCode::GONE) => DIDResolutionError::NotFound,
            _ => DIDResolutionError::InternalError,
        }
    }
}

#[derive(Error, Debug)]
pub enum ParsingErrorSource {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid encoding: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl From<serde_json::Error> for DidWebError {
    fn from(error: serde_json::Error) -> Self {
        DidWebError::ParsingError(ParsingErrorSource::JsonError(error))
    }
}

impl From<std::string::FromUtf8Error> for DidWebError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        DidWebError::ParsingError(ParsingErrorSource::Utf8Error(error))
    }
}
