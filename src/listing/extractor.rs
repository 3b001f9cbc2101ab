use crate::engine::AutomationEngine;
use crate::error::{PageExtractionFailure, RowParseFailure};
use crate::hooks::PipelineHook;
use crate::listing::accumulator::Accumulator;
use crate::listing::locator::MetadataLocator;
use crate::listing::row::{RowError, RowParser};
use futures::stream::{self, StreamExt};

/// What happened to one page's rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page: usize,
    /// Rows present on the loaded page
    pub listed: usize,
    /// Rows handed to the parser (bounded by the room left in the accumulator)
    pub attempted: usize,
    pub appended: usize,
    pub failures: Vec<RowParseFailure>,
}

impl PageReport {
    fn skipped(page: usize) -> Self {
        Self {
            page,
            listed: 0,
            attempted: 0,
            appended: 0,
            failures: Vec::new(),
        }
    }
}

/// Moves the rows of the loaded page into the accumulator
pub struct PageExtractor<E: AutomationEngine> {
    row_selector: String,
    batch_width: usize,
    parser: RowParser<E>,
}

impl<E: AutomationEngine> PageExtractor<E> {
    pub fn new(row_selector: impl Into<String>, batch_width: usize, parser: RowParser<E>) -> Self {
        Self {
            row_selector: row_selector.into(),
            batch_width: batch_width.max(1),
            parser,
        }
    }

    pub fn set_batch_width(&mut self, batch_width: usize) {
        self.batch_width = batch_width.max(1);
    }

    pub fn set_locator(&mut self, locator: Box<dyn MetadataLocator<E>>) {
        self.parser.set_locator(locator);
    }

    /// Parse rows of the loaded page, at most as many as the accumulator can
    /// still take, and append them in page order.
    ///
    /// Malformed rows are skipped and reported. If the engine itself fails,
    /// nothing from this page is appended.
    pub async fn extract_page(
        &self,
        engine: &E,
        page: usize,
        accumulator: &mut Accumulator,
        hook: &dyn PipelineHook,
    ) -> Result<PageReport, PageExtractionFailure> {
        let remaining = accumulator.remaining();
        if remaining == 0 {
            ::log::debug!("Accumulator full, not reading page {}", page);
            return Ok(PageReport::skipped(page));
        }

        let rows = engine
            .query_all(&self.row_selector)
            .await
            .map_err(|source| PageExtractionFailure { page, source })?;
        let selected = &rows[..rows.len().min(remaining)];
        ::log::debug!(
            "Page {} lists {} rows, parsing {} with up to {} in flight",
            page,
            rows.len(),
            selected.len(),
            self.batch_width
        );

        // `buffered` yields in input order no matter which parse finishes first
        let mut parsed = stream::iter(selected.iter().enumerate())
            .map(|(index, row)| async move {
                hook.row_started(page, index);
                let result = self.parser.parse_row(engine, row, page, index).await;
                hook.row_finished(page, index);
                result
            })
            .buffered(self.batch_width);

        let mut entries = Vec::with_capacity(selected.len());
        let mut failures = Vec::new();
        while let Some(result) = parsed.next().await {
            match result {
                Ok(entry) => entries.push(entry),
                Err(RowError::Malformed(failure)) => {
                    hook.row_failed(&failure);
                    failures.push(failure);
                }
                Err(RowError::Engine(source)) => {
                    return Err(PageExtractionFailure { page, source });
                }
            }
        }

        let appended = accumulator.append_page(entries);
        Ok(PageReport {
            page,
            listed: rows.len(),
            attempted: selected.len(),
            appended,
            failures,
        })
    }
}
