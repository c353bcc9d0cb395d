use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CIToolError {
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to fetch {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse time \"{value}\": {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Job result {build_num} ({name}) has no start or stop time")]
    MissingTimestamp { build_num: u64, name: String },

    #[error("No input files: {0}")]
    NoInput(String),

    #[error("Unable to read file \"{}\": {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract JSON from \"{}\": {source}", path.display())]
    ParseInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CIToolError>;
