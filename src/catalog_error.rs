//! Error kinds raised by the catalog core.
//!
//! None of these are fatal. Storage and parse problems on the read path are
//! recovered inside [`crate::catalog_store::CatalogStore`]; everything else is
//! returned to the caller, which keeps its previously loaded catalog.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A stored snapshot could not be parsed as a catalog.
    MalformedStorage(String),
    /// The local LMDB store failed.
    Storage(String),
    Serialization(String),
    /// Remote fetch or write failed, or returned a non-success status.
    NetworkFailure(String),
    /// The remote file changed since its version token was read.
    ConcurrentModification(String),
    /// Input rejected before any write was attempted.
    ValidationFailure(String),
    NotFound(String),
    Unauthorized(String),
    Config(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::MalformedStorage(msg) => write!(f, "Malformed stored catalog: {}", msg),
            CatalogError::Storage(msg) => write!(f, "Storage error: {}", msg),
            CatalogError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            CatalogError::NetworkFailure(msg) => write!(f, "Network failure: {}", msg),
            CatalogError::ConcurrentModification(msg) => write!(f, "Remote file changed concurrently: {}", msg),
            CatalogError::ValidationFailure(msg) => write!(f, "Validation error: {}", msg),
            CatalogError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CatalogError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            CatalogError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<lmdb::Error> for CatalogError {
    fn from(err: lmdb::Error) -> Self {
        CatalogError::Storage(format!("LMDB error: {}", err))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serialization(format!("JSON serialization error: {}", err))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::NetworkFailure(format!("request timed out: {}", err))
        } else {
            CatalogError::NetworkFailure(err.to_string())
        }
    }
}

impl From<base64::DecodeError> for CatalogError {
    fn from(err: base64::DecodeError) -> Self {
        CatalogError::NetworkFailure(format!("remote content is not valid base64: {}", err))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Storage(format!("IO error: {}", err))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
