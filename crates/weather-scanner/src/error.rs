use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),

    #[error("platform error: {0}")]
    Platform(#[from] weather_platform::PlatformError),

    #[error("forecast error: {0}")]
    Forecast(#[from] weather_forecast::ForecastError),
}

pub type ScannerResult<T> = Result<T, ScannerError>;
