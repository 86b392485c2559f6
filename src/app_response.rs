use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::catalog_error::CatalogError;

/// JSON envelope returned across the C ABI.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    NetworkError(String),
    Conflict(String),
    Unauthorized(String),
    Cancelled(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppResponse::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppResponse::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppResponse::Cancelled(msg) => write!(f, "Cancelled: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found".to_string()),
            LmdbError::Corrupted => AppResponse::DatabaseError("Database is corrupted".to_string()),
            LmdbError::MapFull => AppResponse::DatabaseError("Database map is full".to_string()),
            _ => AppResponse::DatabaseError(format!("Database error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<CatalogError> for AppResponse {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MalformedStorage(msg) | CatalogError::Serialization(msg) => {
                AppResponse::SerializationError(msg)
            }
            CatalogError::Storage(msg) | CatalogError::Config(msg) => AppResponse::DatabaseError(msg),
            CatalogError::NetworkFailure(msg) => AppResponse::NetworkError(msg),
            CatalogError::ConcurrentModification(msg) => AppResponse::Conflict(msg),
            CatalogError::ValidationFailure(msg) => AppResponse::ValidationError(msg),
            CatalogError::NotFound(msg) => AppResponse::NotFound(msg),
            CatalogError::Unauthorized(msg) => AppResponse::Unauthorized(msg),
        }
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }
}
