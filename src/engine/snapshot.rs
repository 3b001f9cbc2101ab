use crate::engine::{AutomationEngine, Readiness};
use crate::error::EngineError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};

/// Reference to an element of one loaded snapshot, by document-order position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    page: usize,
    ordinal: usize,
}

struct LoadedPage {
    index: usize,
    document: Html,
}

/// Automation engine that serves saved HTML pages.
///
/// Navigating loads the first page; activating an anchor loads the next page
/// in the sequence, the way a listing's "load more" link would.
pub struct SnapshotEngine {
    pages: Vec<String>,
    loaded: RefCell<Option<LoadedPage>>,
    activations: Cell<usize>,
}

impl SnapshotEngine {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            loaded: RefCell::new(None),
            activations: Cell::new(0),
        }
    }

    /// Read every file as one page, in order
    pub fn from_files<P: AsRef<std::path::Path>>(paths: &[P]) -> std::io::Result<Self> {
        let pages = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(pages))
    }

    /// Number of successful activations so far
    pub fn activations(&self) -> usize {
        self.activations.get()
    }

    /// Index of the page currently loaded
    pub fn current_page(&self) -> Option<usize> {
        self.loaded.borrow().as_ref().map(|p| p.index)
    }

    fn load(&self, index: usize) -> Result<(), EngineError> {
        let html = self
            .pages
            .get(index)
            .ok_or_else(|| EngineError::Command(format!("no snapshot page {}", index)))?;
        ::log::debug!("Loading snapshot page {}", index);
        *self.loaded.borrow_mut() = Some(LoadedPage {
            index,
            document: Html::parse_document(html),
        });
        Ok(())
    }

    /// Run `f` against the element behind `handle`
    fn with_element<T>(
        &self,
        handle: &NodeHandle,
        f: impl FnOnce(ElementRef<'_>, &LoadedPage) -> T,
    ) -> Result<T, EngineError> {
        let loaded = self.loaded.borrow();
        let page = loaded.as_ref().ok_or(EngineError::Stale)?;
        if page.index != handle.page {
            return Err(EngineError::Stale);
        }
        let element = elements(&page.document)
            .nth(handle.ordinal)
            .ok_or(EngineError::Stale)?;
        Ok(f(element, page))
    }
}

/// Every element of `document`, root first, in document order
fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn parse_selector(selector: &str) -> Result<Selector, EngineError> {
    Selector::parse(selector).map_err(|_| EngineError::InvalidSelector(selector.to_string()))
}

fn handle_for(page: &LoadedPage, element: ElementRef<'_>) -> Option<NodeHandle> {
    elements(&page.document)
        .position(|e| e.id() == element.id())
        .map(|ordinal| NodeHandle {
            page: page.index,
            ordinal,
        })
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if el.attr("hidden").is_some() {
        return true;
    }
    el.attr("style")
        .map(|style| {
            let compact: String = style.split_whitespace().collect();
            compact.contains("display:none") || compact.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

#[async_trait(?Send)]
impl AutomationEngine for SnapshotEngine {
    type Handle = NodeHandle;

    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        ::log::debug!("Snapshot navigation to {}", url);
        self.load(0)
    }

    async fn wait_ready(&self, _level: Readiness) -> Result<(), EngineError> {
        // Parsed snapshots are complete as soon as they are loaded
        if self.loaded.borrow().is_some() {
            Ok(())
        } else {
            Err(EngineError::Command("nothing loaded".to_string()))
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<NodeHandle>, EngineError> {
        let selector = parse_selector(selector)?;
        let loaded = self.loaded.borrow();
        let page = loaded
            .as_ref()
            .ok_or_else(|| EngineError::Command("nothing loaded".to_string()))?;

        Ok(elements(&page.document)
            .enumerate()
            .filter(|(_, e)| selector.matches(e))
            .map(|(ordinal, _)| NodeHandle {
                page: page.index,
                ordinal,
            })
            .collect())
    }

    async fn query_within(
        &self,
        scope: &NodeHandle,
        selector: &str,
    ) -> Result<Option<NodeHandle>, EngineError> {
        let selector = parse_selector(selector)?;
        self.with_element(scope, |element, page| {
            element
                .select(&selector)
                .next()
                .and_then(|found| handle_for(page, found))
        })
    }

    async fn next_sibling(&self, handle: &NodeHandle) -> Result<Option<NodeHandle>, EngineError> {
        self.with_element(handle, |element, page| {
            element
                .next_siblings()
                .find_map(ElementRef::wrap)
                .and_then(|sibling| handle_for(page, sibling))
        })
    }

    async fn read_text(&self, handle: &NodeHandle) -> Result<String, EngineError> {
        self.with_element(handle, |element, _| element.text().collect::<String>())
    }

    async fn read_attribute(
        &self,
        handle: &NodeHandle,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        self.with_element(handle, |element, _| {
            element.value().attr(name).map(str::to_string)
        })
    }

    async fn is_visible(&self, handle: &NodeHandle) -> Result<bool, EngineError> {
        self.with_element(handle, |element, _| {
            element.ancestors().filter_map(ElementRef::wrap).all(|a| !is_hidden(a))
                && !is_hidden(element)
        })
    }

    async fn activate(&self, handle: &NodeHandle) -> Result<(), EngineError> {
        self.with_element(handle, |_, _| ())?;
        self.load(handle.page + 1)?;
        self.activations.set(self.activations.get() + 1);
        Ok(())
    }
}
