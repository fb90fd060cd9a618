use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),

    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

pub type ResolverResult<T> = Result<T, ResolverError>;
