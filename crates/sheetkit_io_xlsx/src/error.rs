//! Error types for spreadsheet building and serialization.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Errors surfaced by [`crate::writer::SpreadsheetBuilder`].
#[derive(Error, Debug)]
pub enum XlsxBuildError {
    /// Input data cannot be turned into a sheet (e.g. empty dataset).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Destination path or output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Spreadsheet writer rejected a cell, property or the workbook.
    #[error("xlsx write error: {0}")]
    Xlsx(String),
}

/// Map a writer error, keeping IO failures as [`XlsxBuildError::Io`].
pub fn derive_xlsx_error(err: XlsxError) -> XlsxBuildError {
    match err {
        XlsxError::IoError(err_io) => XlsxBuildError::Io(err_io),
        other => XlsxBuildError::Xlsx(other.to_string()),
    }
}
