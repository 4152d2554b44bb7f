//! Record assembly: drives slides, tables and row groups into records.
//!
//! Failures are contained at the narrowest scope that can absorb them. A bad
//! row, table or slide is reported through the [`EventSink`] and skipped;
//! the run always finishes with whatever could be extracted.

use crate::classify::is_tagging_table;
use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::events::{EventSink, ExtractionEvent};
use crate::extract::build_records;
use crate::grouping::{group_rows, locate_layout};
use crate::title::resolve_title;
use crate::types::{DocumentSource, Row, Slide, Table, TaggingRecord};

/// Counters describing one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub slides: usize,
    pub slides_skipped: usize,
    pub tables: usize,
    pub tagging_tables: usize,
    pub tables_skipped: usize,
    pub rows_skipped: usize,
}

/// Records produced by one run, in document order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    pub records: Vec<TaggingRecord>,
    pub stats: ExtractionStats,
}

impl ExtractionOutcome {
    /// True when nothing was extracted. Not an error.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Extracts tagging records from a document.
#[derive(Debug, Clone, Default)]
pub struct TaggingExtractor {
    config: ExtractorConfig,
}

impl TaggingExtractor {
    /// Create an extractor with the given settings.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run over every slide of `source`, reporting to `sink`.
    ///
    /// Slide, table and row failures are recovered; this never fails once
    /// the document is open.
    pub fn extract<D, S>(&self, source: &mut D, sink: &mut S) -> ExtractionOutcome
    where
        D: DocumentSource + ?Sized,
        S: EventSink,
    {
        let total = source.slide_count();
        sink.info(format!("Document loaded: {} slides", total));

        let mut outcome = ExtractionOutcome::default();
        let mut shapes_since_checkpoint = 0;
        let mut last_progress = 0;

        for position in 0..total {
            let slide_number = position + 1;
            outcome.stats.slides += 1;

            match source.slide(position) {
                Ok(slide) => {
                    shapes_since_checkpoint += slide.shapes.len();
                    self.process_slide(&slide, &mut outcome, sink);
                }
                Err(e) => {
                    outcome.stats.slides_skipped += 1;
                    sink.warning(format!("Skipping slide {}: {}", slide_number, e));
                }
            }

            let progress = progress_percent(slide_number, total).max(last_progress);
            last_progress = progress;
            sink.emit(ExtractionEvent::Progress(progress));

            if slide_number % self.config.checkpoint_slides.max(1) == 0
                || shapes_since_checkpoint > self.config.checkpoint_shapes
            {
                source.reclaim();
                shapes_since_checkpoint = 0;
                sink.info(format!("Resource checkpoint (slide {}/{})", slide_number, total));
            }
        }

        if total == 0 {
            sink.emit(ExtractionEvent::Progress(100));
        }

        if outcome.is_empty() {
            sink.warning("No tagging data extracted. Check the table layout of the document.");
        } else {
            sink.success(format!("Extracted {} tagging records", outcome.len()));
        }

        outcome
    }

    fn process_slide<S: EventSink>(
        &self,
        slide: &Slide,
        outcome: &mut ExtractionOutcome,
        sink: &mut S,
    ) {
        let title = resolve_title(slide, self.config.title_threshold_pt);
        sink.info(format!("Slide {}: {}", slide.index, title));

        let mut table_number = 0;
        for table in slide.tables() {
            table_number += 1;
            outcome.stats.tables += 1;

            if !is_tagging_table(table) {
                sink.info(format!(
                    "Slide {}, table {}: not a tagging guide table, skipped",
                    slide.index, table_number
                ));
                continue;
            }
            outcome.stats.tagging_tables += 1;

            match self.process_table(table, slide.index, table_number, &title, outcome, sink) {
                Ok(records) => {
                    sink.success(format!("  - {} tagging records extracted", records.len()));
                    outcome.records.extend(records);
                }
                Err(e) => {
                    outcome.stats.tables_skipped += 1;
                    sink.warning(format!("Skipping table: {}", e));
                }
            }
        }

        if table_number == 0 {
            sink.info(format!("Slide {} has no tables", slide.index));
        }
    }

    fn process_table<S: EventSink>(
        &self,
        table: &Table,
        slide_index: usize,
        table_number: usize,
        title: &str,
        outcome: &mut ExtractionOutcome,
        sink: &mut S,
    ) -> Result<Vec<TaggingRecord>> {
        let rows: Vec<Vec<String>> = table.rows.iter().map(Row::texts).collect();

        let layout = locate_layout(&rows, self.config.strategy).ok_or_else(|| {
            Error::TableProcessing {
                slide: slide_index,
                table: table_number,
                reason: format!(
                    "header row has no sequence-number column ({:?} layout)",
                    self.config.strategy
                ),
            }
        })?;

        let grouped = group_rows(&rows, &layout);

        for failure in &grouped.row_failures {
            outcome.stats.rows_skipped += 1;
            sink.warning(format!(
                "Slide {}, table {}: skipping {}",
                slide_index, table_number, failure
            ));
        }
        for row in &grouped.orphan_rows {
            sink.warning(format!(
                "Slide {}, table {}: row {} comes before the first numbered row, dropped",
                slide_index, table_number, row
            ));
        }

        if grouped.groups.is_empty() {
            sink.info(format!(
                "Slide {}, table {}: no numbered data rows",
                slide_index, table_number
            ));
        }

        Ok(grouped
            .groups
            .iter()
            .flat_map(|group| build_records(group, slide_index, title))
            .collect())
    }
}

/// Share of slides processed, as a whole percentage.
fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingStrategy;
    use crate::events::{Diagnostic, Severity};
    use crate::types::{AttributeKey, Document, Shape};

    fn tagging_table(rows: &[&[&str]]) -> Table {
        Table::from_rows(rows.iter().map(|r| r.iter().copied()))
    }

    fn warnings(events: &[ExtractionEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ExtractionEvent::Diagnostic(Diagnostic {
                    severity: Severity::Warning,
                    message,
                }) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Source whose listed slides fail to load.
    struct FlakySource {
        inner: Document,
        broken: Vec<usize>,
        reclaimed: usize,
    }

    impl DocumentSource for FlakySource {
        fn slide_count(&self) -> usize {
            self.inner.slide_count()
        }

        fn slide(&mut self, position: usize) -> Result<Slide> {
            if self.broken.contains(&position) {
                return Err(Error::SlideProcessing {
                    slide: position + 1,
                    reason: "malformed slide part".to_string(),
                });
            }
            self.inner.slide(position)
        }

        fn reclaim(&mut self) {
            self.reclaimed += 1;
        }
    }

    #[test]
    fn test_round_trip_scenario() {
        let table = tagging_table(&[
            &["No.", "Tagging Source"],
            &["1", "Click here ga-ca=\"cat\" ga-ac=\"act\""],
            &["", "Click here"],
        ]);
        let mut doc = Document::new(vec![Slide::new(1)
            .with_shape(Shape::title("Home"))
            .with_shape(Shape::table(table))]);

        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut doc, &mut events);

        assert_eq!(outcome.len(), 1);
        let record = &outcome.records[0];
        assert_eq!(record.no, 1);
        assert_eq!(record.slide_index, 1);
        assert_eq!(record.title, "Home");
        assert_eq!(record.action, "Click here");
        assert_eq!(record.attributes.get(AttributeKey::GaCategory), Some("cat"));
        assert_eq!(record.attributes.get(AttributeKey::GaAction), Some("act"));
        assert_eq!(record.attributes.get(AttributeKey::GaLabel), None);
    }

    #[test]
    fn test_records_keep_their_group_number() {
        let table = tagging_table(&[
            &["No.", "Action", "Tagging Source"],
            &["3", "Click logo", "ga-la=\"logo\""],
            &["", "Open search", "ga-la=\"search\""],
            &["8", "Close banner", "ga-la=\"close\""],
        ]);
        let mut doc = Document::new(vec![Slide::new(1).with_shape(Shape::table(table))]);
        let outcome = TaggingExtractor::default().extract(&mut doc, &mut Vec::<ExtractionEvent>::new());

        let numbers: Vec<(u64, &str)> = outcome
            .records
            .iter()
            .map(|r| (r.no, r.action.as_str()))
            .collect();
        assert_eq!(
            numbers,
            vec![(3, "Click logo"), (3, "Open search"), (8, "Close banner")]
        );
        assert_eq!(
            outcome.records[1].attributes.get(AttributeKey::GaLabel),
            Some("search")
        );
    }

    #[test]
    fn test_header_only_table_reports_no_data() {
        let table = tagging_table(&[&["No.", "Tagging Source"]]);
        let mut doc = Document::new(vec![Slide::new(1).with_shape(Shape::table(table))]);

        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut doc, &mut events);

        assert!(outcome.is_empty());
        assert!(events.contains(&ExtractionEvent::Diagnostic(Diagnostic::new(
            Severity::Info,
            "Slide 1, table 1: no numbered data rows"
        ))));
        assert!(warnings(&events)
            .iter()
            .any(|w| w.starts_with("No tagging data extracted")));
    }

    #[test]
    fn test_blank_data_rows_report_no_data() {
        let table = tagging_table(&[&["No.", "Tagging Source"], &["", ""], &[" ", ""]]);
        let mut doc = Document::new(vec![Slide::new(2).with_shape(Shape::table(table))]);

        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut doc, &mut events);

        assert!(outcome.is_empty());
        assert!(events.contains(&ExtractionEvent::Diagnostic(Diagnostic::new(
            Severity::Info,
            "Slide 2, table 1: no numbered data rows"
        ))));
    }

    #[test]
    fn test_non_tagging_table_does_not_affect_siblings() {
        let other = tagging_table(&[&["Menu", "Description"], &["1", "Click me please"]]);
        let tagging = tagging_table(&[&["No", "Tagging"], &["2", "Open the drawer"]]);
        let mut doc = Document::new(vec![Slide::new(4)
            .with_shape(Shape::table(other))
            .with_shape(Shape::table(tagging))]);

        let outcome = TaggingExtractor::default().extract(&mut doc, &mut Vec::<ExtractionEvent>::new());

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.records[0].no, 2);
        assert_eq!(outcome.stats.tables, 2);
        assert_eq!(outcome.stats.tagging_tables, 1);
    }

    #[test]
    fn test_failing_slide_does_not_abort_run() {
        let slides = (1..=3)
            .map(|i| {
                Slide::new(i).with_shape(Shape::table(tagging_table(&[
                    &["No.", "Tagging"],
                    &["1", "Click next"],
                ])))
            })
            .collect();
        let mut source = FlakySource {
            inner: Document::new(slides),
            broken: vec![1],
            reclaimed: 0,
        };

        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut source, &mut events);

        let slides: Vec<usize> = outcome.records.iter().map(|r| r.slide_index).collect();
        assert_eq!(slides, vec![1, 3]);
        assert_eq!(outcome.stats.slides, 3);
        assert_eq!(outcome.stats.slides_skipped, 1);
        assert!(warnings(&events)
            .iter()
            .any(|w| w.starts_with("Skipping slide 2")));
    }

    #[test]
    fn test_failing_table_is_skipped() {
        let broken = tagging_table(&[&["Notes", "Tagging Source"], &["1", "Click"]]);
        let good = tagging_table(&[&["No.", "Tagging Source"], &["1", "Click buy"]]);
        let mut doc = Document::new(vec![Slide::new(1)
            .with_shape(Shape::table(broken))
            .with_shape(Shape::table(good))]);

        let extractor = TaggingExtractor::new(
            ExtractorConfig::new().with_strategy(GroupingStrategy::IndexedHeader),
        );
        let mut events = Vec::new();
        let outcome = extractor.extract(&mut doc, &mut events);

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.records[0].action, "Click buy");
        assert_eq!(outcome.stats.tables_skipped, 1);
        assert!(warnings(&events)
            .iter()
            .any(|w| w.starts_with("Skipping table: Slide 1, table 1")));
    }

    #[test]
    fn test_bad_rows_are_counted() {
        let table = tagging_table(&[
            &["No.", "Tagging"],
            &["stray", "Click nowhere"],
            &["123456789012345678901234567890", "Click overflow"],
            &["1", "Click ok"],
        ]);
        let mut doc = Document::new(vec![Slide::new(1).with_shape(Shape::table(table))]);
        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut doc, &mut events);

        assert_eq!(outcome.len(), 1);
        assert_eq!(outcome.stats.rows_skipped, 1);
        assert_eq!(warnings(&events).len(), 2);
    }

    #[test]
    fn test_progress_is_monotonic_and_completes() {
        let slides = (1..=7).map(Slide::new).collect();
        let mut doc = Document::new(slides);
        let mut events = Vec::new();
        TaggingExtractor::default().extract(&mut doc, &mut events);

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ExtractionEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 7);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
    }

    #[test]
    fn test_checkpoint_reclaims_source() {
        let slides = (1..=5).map(Slide::new).collect();
        let mut source = FlakySource {
            inner: Document::new(slides),
            broken: Vec::new(),
            reclaimed: 0,
        };
        let extractor = TaggingExtractor::new(ExtractorConfig::new().with_checkpoint(2, 500));
        extractor.extract(&mut source, &mut Vec::<ExtractionEvent>::new());
        assert_eq!(source.reclaimed, 2);
    }

    #[test]
    fn test_empty_document() {
        let mut events = Vec::new();
        let outcome = TaggingExtractor::default().extract(&mut Document::default(), &mut events);
        assert!(outcome.is_empty());
        assert!(events.contains(&ExtractionEvent::Progress(100)));
    }
}
