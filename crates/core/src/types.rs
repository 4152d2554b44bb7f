//! Domain types for the slide document model and extracted tagging records.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Read-only, slide-at-a-time access to a presentation.
///
/// Slides are requested by 0-based position. A failure for one slide is
/// recoverable: the extractor reports it and moves on to the next slide.
pub trait DocumentSource {
    /// Total number of slides in the document.
    fn slide_count(&self) -> usize;

    /// Load the slide at the given 0-based position.
    fn slide(&mut self, position: usize) -> Result<Slide>;

    /// Release cached buffers. Called periodically on large documents.
    fn reclaim(&mut self) {}
}

/// An in-memory document, mostly useful for tests and programmatic input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Document {
    /// Create a document from slides.
    pub fn new(slides: Vec<Slide>) -> Self {
        Self { slides }
    }
}

impl DocumentSource for Document {
    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide(&mut self, position: usize) -> Result<Slide> {
        self.slides
            .get(position)
            .cloned()
            .ok_or_else(|| Error::SlideProcessing {
                slide: position + 1,
                reason: "slide index out of range".to_string(),
            })
    }
}

/// A single slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub index: usize,

    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide with the given number.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            shapes: Vec::new(),
        }
    }

    /// Add a shape to this slide.
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Iterate over the tables on this slide, in shape order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.shapes.iter().filter_map(|s| s.table.as_ref())
    }
}

/// A shape on a slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shape {
    /// Text content. `None` if the shape has no text frame.
    pub text: Option<String>,

    /// Vertical offset from the top of the slide, in points. None if unknown.
    pub top: Option<f64>,

    /// Whether this shape is the slide's title placeholder.
    pub is_title: bool,

    /// Table content for graphic frames holding a table.
    pub table: Option<Table>,
}

impl Shape {
    /// A text shape at the given vertical offset.
    pub fn text(text: impl Into<String>, top: Option<f64>) -> Self {
        Self {
            text: Some(text.into()),
            top,
            ..Self::default()
        }
    }

    /// A title placeholder shape.
    pub fn title(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_title: true,
            ..Self::default()
        }
    }

    /// A shape holding a table.
    pub fn table(table: Table) -> Self {
        Self {
            table: Some(table),
            ..Self::default()
        }
    }
}

/// A table of rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    /// Build a table from rows of cell texts.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| Row {
                    cells: cells.into_iter().map(Cell::new).collect(),
                })
                .collect(),
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    /// Trimmed text of every cell in the row.
    pub fn texts(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.text.trim().to_string()).collect()
    }
}

/// A table cell. Text may be empty or span several lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub text: String,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The closed set of recognized analytics attribute keys.
///
/// Declaration order is the export column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeKey {
    #[serde(rename = "data-omni-type")]
    DataOmniType,
    #[serde(rename = "data-omni")]
    DataOmni,
    #[serde(rename = "ga-ca")]
    GaCategory,
    #[serde(rename = "ga-ac")]
    GaAction,
    #[serde(rename = "ga-la")]
    GaLabel,
}

impl AttributeKey {
    /// All keys, in export order.
    pub const ALL: [AttributeKey; 5] = [
        AttributeKey::DataOmniType,
        AttributeKey::DataOmni,
        AttributeKey::GaCategory,
        AttributeKey::GaAction,
        AttributeKey::GaLabel,
    ];

    /// The literal attribute name as it appears in cell text.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKey::DataOmniType => "data-omni-type",
            AttributeKey::DataOmni => "data-omni",
            AttributeKey::GaCategory => "ga-ca",
            AttributeKey::GaAction => "ga-ac",
            AttributeKey::GaLabel => "ga-la",
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute values keyed by [`AttributeKey`]. Values are never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<AttributeKey, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value. Empty (or whitespace-only) values are ignored.
    pub fn insert(&mut self, key: AttributeKey, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: AttributeKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Override values key-by-key with those present in `other`.
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in &other.0 {
            self.0.insert(*key, value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over present attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// One extracted tagging record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggingRecord {
    /// 1-based number of the slide holding the source table.
    pub slide_index: usize,

    /// Resolved title of that slide.
    pub title: String,

    /// Sequence number of the row group, unique within its table only.
    pub no: u64,

    /// Detected action text. Empty when the group had no action candidate.
    pub action: String,

    /// Extracted attributes.
    pub attributes: Attributes,
}
