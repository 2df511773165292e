use std::path::PathBuf;

use crate::document::DocId;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unterminated phrase delimiter at byte {position}")]
    InvalidQuery { position: usize },
    #[error("unknown document {0}")]
    UnknownDocument(DocId),
    #[error("invalid configuration value for `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
