use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("data inconsistency: {0}")]
    Inconsistency(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
