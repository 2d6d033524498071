use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the different failure cases that can occur while the
/// tool reads the source spreadsheet or rewrites the destination.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Raised when a spreadsheet cannot be opened at all. Aborts the run.
    #[error("cannot access spreadsheet {spreadsheet}: {reason}")]
    Access { spreadsheet: String, reason: String },

    /// Raised when a sheet is looked up by title and does not exist.
    #[error("sheet '{0}' not found")]
    SheetMissing(String),

    /// Raised when creating, clearing or writing a destination sheet fails.
    #[error("failed to write sheet '{sheet}': {reason}")]
    Write { sheet: String, reason: String },

    /// Raised when cosmetic cell formatting could not be applied.
    #[error("failed to format sheet '{sheet}': {reason}")]
    FormatApply { sheet: String, reason: String },

    /// Raised when a backend cannot report cell background colours at all.
    #[error("cell colours of sheet '{0}' are not available from this source")]
    ColorsUnavailable(String),

    /// Non-success response returned by the spreadsheet API.
    #[error("spreadsheet API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport failures bubbled up from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl SyncError {
    /// Wraps any lower level failure as a write failure on `sheet`.
    pub fn write(sheet: &str, source: impl std::fmt::Display) -> Self {
        SyncError::Write {
            sheet: sheet.to_string(),
            reason: source.to_string(),
        }
    }
}
