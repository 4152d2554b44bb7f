//! Extraction settings.

use serde::{Deserialize, Serialize};

/// Default vertical offset (points) under which a text shape counts as a title.
pub const DEFAULT_TITLE_THRESHOLD_PT: f64 = 100.0;

/// How the Row Grouping Engine locates the header and the sequence-number column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupingStrategy {
    /// Header is the first row mentioning "tagging"; numbers live in column 0.
    #[default]
    HeaderScan,
    /// Header is row 1; numbers live under the "No." header cell.
    IndexedHeader,
}

/// Settings for a [`crate::TaggingExtractor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Text shapes at or above this offset may serve as the slide title.
    pub title_threshold_pt: f64,

    /// Header and sequence column lookup strategy.
    pub strategy: GroupingStrategy,

    /// Run a resource checkpoint every this many slides.
    pub checkpoint_slides: usize,

    /// Run a resource checkpoint once more than this many shapes were seen.
    pub checkpoint_shapes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            title_threshold_pt: DEFAULT_TITLE_THRESHOLD_PT,
            strategy: GroupingStrategy::default(),
            checkpoint_slides: 20,
            checkpoint_shapes: 500,
        }
    }
}

impl ExtractorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title offset threshold, in points.
    pub fn with_title_threshold(mut self, points: f64) -> Self {
        self.title_threshold_pt = points;
        self
    }

    /// Set the grouping strategy.
    pub fn with_strategy(mut self, strategy: GroupingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the checkpoint cadence.
    pub fn with_checkpoint(mut self, slides: usize, shapes: usize) -> Self {
        self.checkpoint_slides = slides.max(1); // At least every slide
        self.checkpoint_shapes = shapes;
        self
    }
}
