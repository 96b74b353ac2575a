use crate::bus::BusError;
use crate::catalog::CatalogError;

/// Common error type for the selection pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SelectorError {
    #[error("malformed message: {0}")]
    MalformedMessage(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[from] CatalogError),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("message bus failure: {0}")]
    Bus(#[from] BusError),
}

pub type SelectorResult<T> = Result<T, SelectorError>;
