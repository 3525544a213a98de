use chrono::{DateTime, Utc};
use thiserror::Error;

/// Structural and temporal errors on credentials and presentations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("credential is not valid before {0}")]
    NotYetValid(DateTime<Utc>),
    #[error("credential expired at {0}")]
    Expired(DateTime<Utc>),
}
