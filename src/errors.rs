// src/errors.rs
use thiserror::Error;

/// Errors surfaced to HTTP callers, either from request handling
/// (missing input, unknown route) or from a stage of the scan pipeline.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("No competitor configured")]
    NoCompetitor,
    #[error("No report found.")]
    NoReport,
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Scan failed during {stage}: {message}")]
    Pipeline {
        stage: &'static str,
        message: String,
    },
    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound | ServerError::NoCompetitor | ServerError::NoReport => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Forbidden(_) => 403,
            ServerError::DbError(_)
            | ServerError::Pipeline { .. }
            | ServerError::InternalError => 500,
        }
    }
}

/// Page retrieval failures. The scan treats every variant as "no HTML".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("response too short ({0} bytes)")]
    TooShort(usize),
    #[error("failed to fetch page. Tried: {0}")]
    Exhausted(String),
}

/// Failures talking to the language-generation collaborator.
/// Never reaches a caller: the insight gate degrades them to a canned result.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight provider not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Request(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("no JSON object in response")]
    NoJson,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
