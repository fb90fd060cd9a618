use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unparseable range label: {0:?}")]
    UnparseableRange(String),

    #[error("pagination truncated after {0} pages without reaching a terminal cursor")]
    PaginationTruncated(usize),

    #[error("{0}")]
    Other(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;
