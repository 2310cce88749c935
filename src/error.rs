use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads survey workbooks, reshapes them, or writes the collection table.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as listing directories or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the collection directory does not exist.
    #[error("input directory not found: {0}")]
    MissingInput(PathBuf),

    /// Errors bubbled up from the Excel reader while opening a workbook.
    #[error("Excel read error in {path}: {source}")]
    ExcelRead {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the CSV writer fails.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a sheet, column, or metadata cell is missing or malformed.
    #[error("invalid input file {path}: {reason}")]
    InputFormat { path: PathBuf, reason: String },

    /// Raised when a merged record does not cover the output schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    pub(crate) fn input_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ToolError::InputFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
