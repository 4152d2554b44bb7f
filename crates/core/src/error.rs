//! Error types for tagging-guide extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting tagging records.
///
/// Only [`Error::DocumentOpen`] (and the I/O plumbing around it) aborts an
/// extraction run. The slide, table, row and cell variants are recovered at
/// their own scope and reported as diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The document could not be opened at all.
    #[error("Failed to open document: {0}")]
    DocumentOpen(String),

    /// A single slide could not be read or processed.
    #[error("Slide {slide}: {reason}")]
    SlideProcessing { slide: usize, reason: String },

    /// A table (or one of its row groups) could not be processed.
    #[error("Slide {slide}, table {table}: {reason}")]
    TableProcessing {
        slide: usize,
        table: usize,
        reason: String,
    },

    /// A single table row could not be interpreted.
    #[error("Row {row}: {reason}")]
    RowProcessing { row: usize, reason: String },

    /// Text of a single cell could not be decoded.
    #[error("Cell text extraction error: {0}")]
    CellExtraction(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// The extraction worker thread panicked.
    #[error("Extraction worker terminated unexpectedly")]
    WorkerPanicked,

    /// Failed to render records for export.
    #[error("Export error: {0}")]
    Export(String),
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Export(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Export(e.to_string())
    }
}
