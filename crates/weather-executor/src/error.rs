use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
