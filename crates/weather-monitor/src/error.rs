use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),
}

pub type MonitorResult<T> = Result<T, MonitorError>;
