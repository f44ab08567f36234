//! Error types for the export pipeline and its collaborators.

use thiserror::Error;

/// Fatal export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("home sheet not found: {0}")]
    MissingSheet(String),

    #[error("year or month missing on sheet {0} (expected year in A2, month in B2)")]
    MissingPeriod(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors raised by a [`crate::sheet::SheetBackend`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("sheet already exists: {0}")]
    SheetExists(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("value grid is {got_rows}x{got_cols}, range is {rows}x{cols}")]
    ShapeMismatch {
        rows: u32,
        cols: u32,
        got_rows: usize,
        got_cols: usize,
    },

    #[error("{0}")]
    Other(String),
}

/// Errors raised by a [`crate::source::CalendarSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("calendar not found: {0}")]
    CalendarNotFound(String),

    #[cfg(feature = "ics")]
    #[error(transparent)]
    Ics(#[from] ics_source::IcsError),

    #[error("{0}")]
    Other(String),
}

/// Errors loading, saving or rendering a [`crate::workbook::Workbook`].
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to read or write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid workbook document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid workbook: {0}")]
    Invalid(String),

    #[error("xlsx export failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
