use crate::MAX_PAGE_CYCLES;
use crate::config::{ListingConfig, Readiness, Selectors};
use crate::engine::AutomationEngine;
use crate::entry::Entry;
use crate::error::{NavigationFailure, RowParseFailure};
use crate::hooks::{Hooks, LoggingHook, PipelineHook};
use crate::listing::accumulator::Accumulator;
use crate::listing::extractor::PageExtractor;
use crate::listing::locator::{MetadataLocator, NextSiblingRow};
use crate::listing::pagination::{Advance, PageState, PaginationController};
use crate::listing::row::RowParser;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Why the page loop stopped. Every reason ends the run the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The accumulator holds the maximum number of entries
    CapReached,
    /// The listing offered no further page
    Exhausted,
    /// Revealing the next page did not settle in time
    PaginationTimedOut,
    /// The fixed number of page cycles was used up
    CycleBound,
    /// A page's rows could not be read
    ExtractionFailed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Termination::CapReached => "entry cap reached",
            Termination::Exhausted => "pagination exhausted",
            Termination::PaginationTimedOut => "pagination timed out",
            Termination::CycleBound => "page cycle bound reached",
            Termination::ExtractionFailed => "page extraction failed",
        };
        f.write_str(reason)
    }
}

/// Result of a run
#[derive(Debug)]
pub struct Harvest {
    /// Most recent first
    pub entries: Vec<Entry>,
    pub termination: Termination,
    /// Pages loaded, including the first
    pub pages_loaded: usize,
    pub row_failures: Vec<RowParseFailure>,
}

/// Visits a listing, walks its pages and ranks what it finds.
///
/// Owns its engine for as long as it lives, so a single browsing context is
/// never driven by two runs at once.
pub struct Pipeline<E: AutomationEngine> {
    engine: E,
    extractor: PageExtractor<E>,
    pagination: PaginationController,
    readiness: Readiness,
    navigation_timeout: Duration,
    hooks: Hooks,
    state: PageState,
}

impl<E: AutomationEngine> Pipeline<E> {
    /// Create a pipeline driving `engine`, with logging enabled
    pub fn new(engine: E, config: &ListingConfig) -> Self {
        let mut hooks = Hooks::new();
        hooks.push(Arc::new(LoggingHook));

        Self {
            engine,
            extractor: build_extractor(&config.selectors, config.batch_width),
            pagination: PaginationController::new(
                config.selectors.more.clone(),
                config.readiness,
                config.pagination_timeout(),
            ),
            readiness: config.readiness,
            navigation_timeout: config.navigation_timeout(),
            hooks,
            state: PageState::Unvisited,
        }
    }

    /// Set the maximum number of row parses in flight
    pub fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.extractor.set_batch_width(batch_width);
        self
    }

    /// Replace where the parser looks for a row's age indicator
    pub fn with_locator(mut self, locator: Box<dyn MetadataLocator<E>>) -> Self {
        self.extractor.set_locator(locator);
        self
    }

    /// Set the readiness level awaited after navigation and pagination
    pub fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self.pagination.set_readiness(readiness);
        self
    }

    /// Register an additional observer
    pub fn with_hook(mut self, hook: Arc<dyn PipelineHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Visit `start_url`, gather entries across pages and return them most
    /// recent first.
    ///
    /// Only a failure to load the starting page is an error; everything
    /// after that degrades to returning what was gathered so far.
    pub async fn run(&mut self, start_url: &str) -> Result<Harvest, NavigationFailure> {
        self.visit(start_url).await?;

        let mut accumulator = Accumulator::new();
        let mut row_failures = Vec::new();
        let mut termination = Termination::CycleBound;
        let mut page = 1;

        for cycle in 1..=MAX_PAGE_CYCLES {
            match self
                .extractor
                .extract_page(&self.engine, page, &mut accumulator, &self.hooks)
                .await
            {
                Ok(report) => {
                    self.hooks.page_extracted(&report);
                    row_failures.extend(report.failures);
                }
                Err(failure) => {
                    self.hooks.extraction_failed(&failure);
                    termination = Termination::ExtractionFailed;
                    break;
                }
            }

            if accumulator.is_full() {
                termination = Termination::CapReached;
                break;
            }
            // A further page could not be read within the bound
            if cycle == MAX_PAGE_CYCLES {
                break;
            }

            let outcome = self.pagination.advance(&self.engine).await;
            self.hooks.advanced(page, &outcome);
            self.state = PaginationController::transition(self.state, &outcome);
            match outcome {
                Advance::Advanced => page += 1,
                Advance::TimedOut(_) => {
                    termination = Termination::PaginationTimedOut;
                    break;
                }
                Advance::Exhausted | Advance::Stalled(_) => {
                    termination = Termination::Exhausted;
                    break;
                }
            }
        }

        let entries = accumulator.into_ranked();
        self.hooks.finished(termination, entries.len());

        Ok(Harvest {
            entries,
            termination,
            pages_loaded: page,
            row_failures,
        })
    }

    async fn visit(&mut self, start_url: &str) -> Result<(), NavigationFailure> {
        let url = Url::parse(start_url).map_err(|source| NavigationFailure::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;
        ::log::info!("Visiting {}", url);

        let load = async {
            self.engine.navigate(url.as_str()).await?;
            self.engine.wait_ready(self.readiness).await
        };

        let loaded = timeout(self.navigation_timeout, load).await;
        match loaded {
            Ok(Ok(())) => {
                self.state = PageState::Loaded(1);
                Ok(())
            }
            Ok(Err(source)) => Err(NavigationFailure::Engine {
                url: url.to_string(),
                source,
            }),
            Err(_) => Err(NavigationFailure::TimedOut {
                url: url.to_string(),
                after: self.navigation_timeout,
            }),
        }
    }
}

fn build_extractor<E: AutomationEngine>(
    selectors: &Selectors,
    batch_width: usize,
) -> PageExtractor<E> {
    let locator: Box<dyn MetadataLocator<E>> = Box::new(NextSiblingRow::new(selectors.age.clone()));
    let parser = RowParser::new(selectors, locator);
    PageExtractor::new(selectors.row.clone(), batch_width, parser)
}
