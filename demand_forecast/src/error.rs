//! Error types for the demand_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The uploaded file could not be decoded or parsed
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    /// The uploaded file lacks one or more required columns
    #[error(
        "The file must contain the following columns: {} (missing: {})",
        crate::data::REQUIRED_COLUMNS.join(", "),
        .0.join(", ")
    )]
    MissingColumns(Vec<String>),

    /// A `Demande` cell holds text that is not a number
    #[error("Column 'Demande' must be numeric: '{value}' on line {line}")]
    NonNumericDemand { line: usize, value: String },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from loading or validating configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from drawing the forecast chart
    #[error("Chart error: {0}")]
    ChartError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from reading or writing delimited text
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
