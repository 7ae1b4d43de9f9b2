//! Error types for the library-side modules.
//!
//! The binary itself works with `anyhow`; these enums are what the
//! service client, the form store and the exporters return.

use thiserror::Error;

/// Recommendation service errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Recommendation service unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Cannot connect to recommendation service at {base_url}")]
    Connect { base_url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Api { status, .. } => *status >= 500,
            ApiError::Timeout { .. } | ApiError::Connect { .. } | ApiError::Http(_) => true,
            ApiError::Unavailable { .. } | ApiError::InvalidResponse { .. } => false,
        }
    }
}

/// Form store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode form values: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export: submit a recommendation first")]
    NothingToExport,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Export produced invalid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

pub type StoreResult<T> = Result<T, StoreError>;

pub type ExportResult<T> = Result<T, ExportError>;
