use crate::error::{PageExtractionFailure, RowParseFailure};
use crate::listing::extractor::PageReport;
use crate::listing::pagination::Advance;
use crate::listing::pipeline::Termination;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Observer of pipeline progress.
///
/// Every method has an empty default so a hook only implements what it
/// cares about. Called from the pipeline's task; row events may interleave
/// while a page is parsed concurrently.
pub trait PipelineHook: Send + Sync {
    fn row_started(&self, _page: usize, _index: usize) {}

    fn row_finished(&self, _page: usize, _index: usize) {}

    fn row_failed(&self, _failure: &RowParseFailure) {}

    fn page_extracted(&self, _report: &PageReport) {}

    fn extraction_failed(&self, _failure: &PageExtractionFailure) {}

    fn advanced(&self, _from_page: usize, _outcome: &Advance) {}

    fn finished(&self, _termination: Termination, _entries: usize) {}
}

/// Reports progress through the `log` facade
#[derive(Debug, Default)]
pub struct LoggingHook;

impl PipelineHook for LoggingHook {
    fn row_started(&self, page: usize, index: usize) {
        ::log::trace!("Parsing row {} of page {}", index, page);
    }

    fn row_failed(&self, failure: &RowParseFailure) {
        ::log::warn!("Skipping {}", failure);
    }

    fn page_extracted(&self, report: &PageReport) {
        ::log::info!(
            "Page {}: {} rows listed, {} parsed, {} appended, {} skipped",
            report.page,
            report.listed,
            report.attempted,
            report.appended,
            report.failures.len()
        );
    }

    fn extraction_failed(&self, failure: &PageExtractionFailure) {
        ::log::error!("{}: {}", failure, failure.source);
    }

    fn advanced(&self, from_page: usize, outcome: &Advance) {
        match outcome {
            Advance::Advanced => ::log::info!("Loaded page {}", from_page + 1),
            Advance::Exhausted => ::log::info!("No more pages after page {}", from_page),
            Advance::TimedOut(timeout) => {
                ::log::warn!("Pagination after page {}: {}", from_page, timeout)
            }
            Advance::Stalled(e) => ::log::warn!("Pagination after page {} failed: {}", from_page, e),
        }
    }

    fn finished(&self, termination: Termination, entries: usize) {
        ::log::info!("Run finished ({}) with {} entries", termination, entries);
    }
}

/// Counting collector, shareable with the caller
#[derive(Debug, Default)]
pub struct Metrics {
    rows_started: AtomicUsize,
    rows_appended: AtomicUsize,
    rows_failed: AtomicUsize,
    pages_extracted: AtomicUsize,
    pages_failed: AtomicUsize,
    advances: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Point-in-time copy of [`Metrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub rows_started: usize,
    /// Rows that made it into the accumulator
    pub rows_appended: usize,
    pub rows_failed: usize,
    pub pages_extracted: usize,
    pub pages_failed: usize,
    /// Activations of the load-more control that produced a new page
    pub advances: usize,
    pub peak_in_flight: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_started: self.rows_started.load(Ordering::Relaxed),
            rows_appended: self.rows_appended.load(Ordering::Relaxed),
            rows_failed: self.rows_failed.load(Ordering::Relaxed),
            pages_extracted: self.pages_extracted.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            advances: self.advances.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
        }
    }
}

impl PipelineHook for Metrics {
    fn row_started(&self, _page: usize, _index: usize) {
        self.rows_started.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::Relaxed);
    }

    fn row_finished(&self, _page: usize, _index: usize) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    fn row_failed(&self, _failure: &RowParseFailure) {
        self.rows_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn page_extracted(&self, report: &PageReport) {
        self.pages_extracted.fetch_add(1, Ordering::Relaxed);
        self.rows_appended.fetch_add(report.appended, Ordering::Relaxed);
    }

    fn extraction_failed(&self, _failure: &PageExtractionFailure) {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn advanced(&self, _from_page: usize, outcome: &Advance) {
        if outcome.advanced() {
            self.advances.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Fans every event out to a list of hooks, in registration order
#[derive(Default, Clone)]
pub struct Hooks {
    hooks: Vec<Arc<dyn PipelineHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: Arc<dyn PipelineHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl PipelineHook for Hooks {
    fn row_started(&self, page: usize, index: usize) {
        self.hooks.iter().for_each(|h| h.row_started(page, index));
    }

    fn row_finished(&self, page: usize, index: usize) {
        self.hooks.iter().for_each(|h| h.row_finished(page, index));
    }

    fn row_failed(&self, failure: &RowParseFailure) {
        self.hooks.iter().for_each(|h| h.row_failed(failure));
    }

    fn page_extracted(&self, report: &PageReport) {
        self.hooks.iter().for_each(|h| h.page_extracted(report));
    }

    fn extraction_failed(&self, failure: &PageExtractionFailure) {
        self.hooks.iter().for_each(|h| h.extraction_failed(failure));
    }

    fn advanced(&self, from_page: usize, outcome: &Advance) {
        self.hooks.iter().for_each(|h| h.advanced(from_page, outcome));
    }

    fn finished(&self, termination: Termination, entries: usize) {
        self.hooks.iter().for_each(|h| h.finished(termination, entries));
    }
}
