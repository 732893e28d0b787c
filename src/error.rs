//! Error type shared by the library modules

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FarmError {
    #[error("no plant profile named '{0}'")]
    UnknownPlant(String),

    #[error("'{0}' is neither a material nor a shop item")]
    UnknownCostEntry(String),

    #[error("'{0}' is a material name and cannot name a shop item")]
    ReservedShopName(String),

    #[error("failed to parse saved data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid '{field}' in saved data: {source}")]
    Field {
        field: &'static str,
        source: serde_json::Error,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid export file pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, FarmError>;
