use crate::engine::{AutomationEngine, Readiness};
use crate::error::{EngineError, PaginationTimeout};
use std::time::Duration;
use tokio::time::timeout;

/// Outcome of trying to reveal the next page
#[derive(Debug)]
pub enum Advance {
    /// New rows are loaded and queryable
    Advanced,
    /// No visible load-more control; the listing has no further pages
    Exhausted,
    /// The control was activated but the page did not settle in time
    TimedOut(PaginationTimeout),
    /// The engine failed while looking for, activating or waiting on the control
    Stalled(EngineError),
}

impl Advance {
    /// Whether a new page is now loaded
    pub fn advanced(&self) -> bool {
        matches!(self, Advance::Advanced)
    }
}

/// Where the pipeline is in the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Unvisited,
    Loaded(usize),
    Exhausted,
}

/// Detects and activates the listing's "load more" control
pub struct PaginationController {
    more_selector: String,
    readiness: Readiness,
    timeout: Duration,
}

impl PaginationController {
    pub fn new(more_selector: impl Into<String>, readiness: Readiness, timeout: Duration) -> Self {
        Self {
            more_selector: more_selector.into(),
            readiness,
            timeout,
        }
    }

    pub fn set_readiness(&mut self, readiness: Readiness) {
        self.readiness = readiness;
    }

    /// Reveal the next page if the listing offers one
    pub async fn advance<E: AutomationEngine>(&self, engine: &E) -> Advance {
        let control = match engine.query_all(&self.more_selector).await {
            Ok(found) => found.into_iter().next(),
            Err(e) => return Advance::Stalled(e),
        };
        let Some(control) = control else {
            ::log::debug!("No element matches {}", self.more_selector);
            return Advance::Exhausted;
        };

        match engine.is_visible(&control).await {
            Ok(true) => {}
            Ok(false) => {
                ::log::debug!("Load-more control present but hidden");
                return Advance::Exhausted;
            }
            Err(e) => return Advance::Stalled(e),
        }

        let reveal = async {
            engine.activate(&control).await?;
            engine.wait_ready(self.readiness).await
        };

        match timeout(self.timeout, reveal).await {
            Ok(Ok(())) => Advance::Advanced,
            Ok(Err(e)) => Advance::Stalled(e),
            Err(_) => Advance::TimedOut(PaginationTimeout {
                after: self.timeout,
            }),
        }
    }

    /// Next state after an attempt to advance from `state`
    pub fn transition(state: PageState, outcome: &Advance) -> PageState {
        match (state, outcome.advanced()) {
            (PageState::Loaded(page), true) => PageState::Loaded(page + 1),
            (PageState::Loaded(_), false) => PageState::Exhausted,
            (other, _) => other,
        }
    }
}
