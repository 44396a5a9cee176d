use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("table not found: {0}")]
    NotFound(String),

    #[error("storage lock poisoned")]
    Poisoned,

    #[error("invalid tag set '{0}'")]
    InvalidTags(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ingest failed at line {line}: {reason}")]
    Ingest { line: usize, reason: String },
}

impl From<StorageError> for tagql_core::Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(name) => tagql_core::Error::NotFound(name),
            other => tagql_core::Error::Storage(other.to_string()),
        }
    }
}
