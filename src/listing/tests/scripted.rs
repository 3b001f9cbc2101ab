use crate::config::{Readiness, Selectors};
use crate::engine::AutomationEngine;
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// One listed item as the scripted engine presents it
#[derive(Debug, Clone)]
pub struct ScriptedRow {
    pub title: Option<String>,
    pub link: Option<String>,
    pub has_metadata: bool,
    pub has_age: bool,
    pub timestamp: Option<String>,
}

impl ScriptedRow {
    pub fn at(title: impl Into<String>, secs: i64) -> Self {
        let title = title.into();
        Self {
            link: Some(format!("item?id={}", title)),
            title: Some(title),
            has_metadata: true,
            has_age: true,
            timestamp: Some(listing_timestamp(secs)),
        }
    }
}

/// The listing's own timestamp format: ISO instant then unix seconds
pub fn listing_timestamp(secs: i64) -> String {
    let at = Utc.timestamp_opt(secs, 0).unwrap();
    format!("{} {}", at.format("%Y-%m-%dT%H:%M:%S"), secs)
}

#[derive(Debug, Clone)]
pub struct ScriptedPage {
    pub rows: Vec<ScriptedRow>,
    /// `None` when the page has no load-more control at all
    pub more_visible: Option<bool>,
}

impl ScriptedPage {
    /// Rows titled `p<page>-r<index>` carrying the given recency values
    pub fn with_recencies(page: usize, recencies: &[i64], more_visible: Option<bool>) -> Self {
        Self {
            rows: recencies
                .iter()
                .enumerate()
                .map(|(i, secs)| ScriptedRow::at(format!("p{}-r{}", page, i), *secs))
                .collect(),
            more_visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Row(usize, usize),
    Metadata(usize, usize),
    Anchor(usize, usize),
    Age(usize, usize),
    More(usize),
}

impl Node {
    fn page(&self) -> usize {
        match *self {
            Node::Row(p, _) | Node::Metadata(p, _) | Node::Anchor(p, _) | Node::Age(p, _) => p,
            Node::More(p) => p,
        }
    }
}

/// In-memory listing that records how it is driven
#[derive(Default)]
pub struct ScriptedEngine {
    pages: Vec<ScriptedPage>,
    selectors: Selectors,
    current: Cell<Option<usize>>,
    pub navigations: Cell<usize>,
    pub row_queries: Cell<usize>,
    pub activations: Cell<usize>,
    /// Every readiness level waited for, in order
    pub readiness_waits: RefCell<Vec<Readiness>>,
    pub fail_navigation: bool,
    /// Page whose row query fails
    pub fail_row_query_on: Option<usize>,
    /// (page, row) whose anchor read fails at the engine level
    pub fail_read_on: Option<(usize, usize)>,
    /// Delay before a page revealed by activation reports ready
    pub ready_delay: Option<Duration>,
}

impl ScriptedEngine {
    pub fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn page(&self) -> Result<(usize, &ScriptedPage), EngineError> {
        let index = self
            .current
            .get()
            .ok_or_else(|| EngineError::Command("nothing loaded".to_string()))?;
        Ok((index, &self.pages[index]))
    }

    fn row(&self, node: &Node) -> Result<&ScriptedRow, EngineError> {
        let (current, page) = self.page()?;
        if node.page() != current {
            return Err(EngineError::Stale);
        }
        match *node {
            Node::Row(_, i) | Node::Metadata(_, i) | Node::Anchor(_, i) | Node::Age(_, i) => {
                Ok(&page.rows[i])
            }
            Node::More(_) => Err(EngineError::Command("not a row".to_string())),
        }
    }
}

#[async_trait(?Send)]
impl AutomationEngine for ScriptedEngine {
    type Handle = Node;

    async fn navigate(&self, _url: &str) -> Result<(), EngineError> {
        self.navigations.set(self.navigations.get() + 1);
        if self.fail_navigation {
            return Err(EngineError::Command("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        self.current.set(Some(0));
        Ok(())
    }

    async fn wait_ready(&self, level: Readiness) -> Result<(), EngineError> {
        self.readiness_waits.borrow_mut().push(level);
        if let (Some(delay), true) = (self.ready_delay, self.activations.get() > 0) {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Node>, EngineError> {
        let (index, page) = self.page()?;
        if selector == self.selectors.row {
            self.row_queries.set(self.row_queries.get() + 1);
            if self.fail_row_query_on == Some(index) {
                return Err(EngineError::Command("invalid session id".to_string()));
            }
            return Ok((0..page.rows.len()).map(|i| Node::Row(index, i)).collect());
        }
        if selector == self.selectors.more {
            return Ok(page.more_visible.map(|_| Node::More(index)).into_iter().collect());
        }
        Ok(Vec::new())
    }

    async fn query_within(&self, scope: &Node, selector: &str) -> Result<Option<Node>, EngineError> {
        let row = self.row(scope)?;
        Ok(match *scope {
            Node::Row(p, i) if selector == self.selectors.title && row.title.is_some() => {
                Some(Node::Anchor(p, i))
            }
            Node::Metadata(p, i) if selector == self.selectors.age && row.has_age => {
                Some(Node::Age(p, i))
            }
            _ => None,
        })
    }

    async fn next_sibling(&self, handle: &Node) -> Result<Option<Node>, EngineError> {
        let row = self.row(handle)?;
        Ok(match *handle {
            Node::Row(p, i) if row.has_metadata => Some(Node::Metadata(p, i)),
            _ => None,
        })
    }

    async fn read_text(&self, handle: &Node) -> Result<String, EngineError> {
        tokio::task::yield_now().await;
        if let Node::Anchor(p, i) = *handle {
            if self.fail_read_on == Some((p, i)) {
                return Err(EngineError::Command("invalid session id".to_string()));
            }
        }
        let row = self.row(handle)?;
        Ok(format!("  {}  ", row.title.clone().unwrap_or_default()))
    }

    async fn read_attribute(&self, handle: &Node, name: &str) -> Result<Option<String>, EngineError> {
        tokio::task::yield_now().await;
        let row = self.row(handle)?;
        Ok(match (*handle, name) {
            (Node::Anchor(..), "href") => row.link.clone(),
            (Node::Age(..), "title") => row.timestamp.clone(),
            _ => None,
        })
    }

    async fn is_visible(&self, handle: &Node) -> Result<bool, EngineError> {
        let (current, page) = self.page()?;
        if handle.page() != current {
            return Err(EngineError::Stale);
        }
        Ok(page.more_visible.unwrap_or(false))
    }

    async fn activate(&self, handle: &Node) -> Result<(), EngineError> {
        let (current, _) = self.page()?;
        if *handle != Node::More(current) {
            return Err(EngineError::Stale);
        }
        if current + 1 >= self.pages.len() {
            return Err(EngineError::Command("no further page".to_string()));
        }
        self.current.set(Some(current + 1));
        self.activations.set(self.activations.get() + 1);
        Ok(())
    }
}
