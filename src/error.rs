use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppraisalError {
    #[error("Invalid discount rate {0}: must be finite and greater than -1")]
    InvalidDiscountRate(f64),

    #[error("Invalid cash-flow series: {0}")]
    InvalidSeries(String),

    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: f64 },

    #[error("Validation error for '{field}': {details}")]
    ValidationError { field: String, details: String },

    #[error("Missing figure: {0}")]
    MissingFigure(&'static str),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AppraisalError>;
