use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage error: {0}")]
    Storage(#[from] weather_storage::StorageError),

    #[error("no forecast sources returned data for {city} on {date}")]
    NoSources { city: String, date: String },
}

pub type ForecastResult<T> = Result<T, ForecastError>;
