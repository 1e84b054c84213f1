use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Search index not available")]
    IndexUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
