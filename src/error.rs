use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Terminal failure of an ingestion run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("mapping failed: {0}")]
    Mapping(#[from] MappingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Extraction,
    Auth,
    Api,
    Mapping,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Configuration(_) => ErrorKind::Configuration,
            IngestError::Extraction(_) => ErrorKind::Extraction,
            IngestError::Auth(_) => ErrorKind::Auth,
            IngestError::Api(_) => ErrorKind::Api,
            IngestError::Mapping(_) => ErrorKind::Mapping,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("timed out after {waited:?} waiting for {artifact}")]
    Timeout { waited: Duration, artifact: String },

    #[error("source returned status {status}")]
    Status { status: u16 },

    #[error("download failed: {0}")]
    Download(#[source] reqwest::Error),

    #[error("file operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed results table: {0}")]
    Table(#[from] csv::Error),

    #[error("unreadable workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("workbook has no worksheet")]
    NoWorksheet,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed auth response: {0}")]
    MalformedResponse(String),

    #[error("login request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Fail-stop upload failure. Earlier batches stay persisted remotely.
    #[error("batch {batch} of {total} rejected with status {status}: {body}")]
    BatchRejected {
        batch: usize,
        total: usize,
        status: u16,
        body: String,
    },

    /// Upload batch that never got a response.
    #[error("batch {batch} of {total} failed: {source}")]
    BatchFailed {
        batch: usize,
        total: usize,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("invalid currency value {text:?}")]
    InvalidCurrency { text: String },

    #[error("expected {expected} unique drawn numbers, found {found}")]
    DrawnNumberCount { expected: usize, found: usize },

    #[error("drawn number {value} is outside 1..={max}")]
    BallOutOfRange { value: u32, max: u32 },

    #[error("no calendar date follows {0}")]
    DateOverflow(chrono::NaiveDate),

    #[error("contest {0} has no successor contest number")]
    ContestOverflow(u32),

    #[error("contest {contest}: {source}")]
    Row {
        contest: u32,
        #[source]
        source: Box<MappingError>,
    },
}
