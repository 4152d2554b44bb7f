//! Core document model and tagging-guide extraction for slide decks.
//!
//! Finds "tagging guide" tables in a presentation, groups their rows into
//! numbered records, detects the user action of each record and pulls the
//! analytics attributes (`data-omni-type`, `data-omni`, `ga-ca`, `ga-ac`,
//! `ga-la`) out of the cell text.

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod extract;
pub mod extractor;
pub mod grouping;
pub mod title;
pub mod types;
pub mod worker;

pub use config::{ExtractorConfig, GroupingStrategy};
pub use error::{Error, Result};
pub use events::{Diagnostic, EventSink, ExtractionEvent, LogSink, Severity};
pub use export::{ExportFormat, RecordWriter};
pub use extractor::{ExtractionOutcome, ExtractionStats, TaggingExtractor};
pub use types::{
    AttributeKey, Attributes, Cell, Document, DocumentSource, Row, Shape, Slide, Table,
    TaggingRecord,
};
pub use worker::{spawn_extraction, ExtractionHandle};
