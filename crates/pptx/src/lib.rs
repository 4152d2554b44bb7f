//! PPTX (Office Open XML) document adapter for tagging-guide extraction.
//!
//! Reads .pptx files, which are ZIP archives containing XML documents, and
//! exposes their slides, shapes and tables through
//! [`tagging_core::DocumentSource`].

pub mod parser;

pub use parser::{PptxDocument, PptxParser};
