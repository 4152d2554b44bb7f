//! Background extraction worker.
//!
//! Runs one extraction on a dedicated thread so that a large document does
//! not block whoever is driving it. Events arrive on a bounded channel; the
//! final outcome comes back through [`ExtractionHandle::join`].

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::events::{EventSink, ExtractionEvent};
use crate::extractor::{ExtractionOutcome, TaggingExtractor};
use crate::types::DocumentSource;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Capacity of the event channel between worker and caller.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Handle to a running extraction.
pub struct ExtractionHandle {
    events: Receiver<ExtractionEvent>,
    worker: JoinHandle<Result<ExtractionOutcome>>,
}

impl ExtractionHandle {
    /// Events emitted by the worker. Iteration ends when the worker is done.
    pub fn events(&self) -> &Receiver<ExtractionEvent> {
        &self.events
    }

    /// Wait for the worker to finish.
    ///
    /// Events that were not consumed yet are discarded.
    pub fn join(self) -> Result<ExtractionOutcome> {
        drop(self.events);
        self.worker.join().map_err(|_| Error::WorkerPanicked)?
    }
}

/// Open a document and extract it on a new thread.
///
/// `open` runs on the worker. Its failure is the only fatal outcome and is
/// returned from [`ExtractionHandle::join`] after an error event.
pub fn spawn_extraction<F, D>(open: F, config: ExtractorConfig) -> Result<ExtractionHandle>
where
    F: FnOnce() -> Result<D> + Send + 'static,
    D: DocumentSource + 'static,
{
    let (tx, rx) = mpsc::sync_channel(EVENT_CHANNEL_CAPACITY);

    let worker = thread::Builder::new()
        .name("tagging-extract".to_string())
        .spawn(move || {
            let mut sink = tx;
            let mut source = match open() {
                Ok(source) => source,
                Err(e) => {
                    sink.error(format!("Extraction failed: {}", e));
                    return Err(e);
                }
            };
            let extractor = TaggingExtractor::new(config);
            Ok(extractor.extract(&mut source, &mut sink))
        })?;

    Ok(ExtractionHandle { events: rx, worker })
}
