pub mod snapshot;
pub mod webdriver;

pub use crate::config::Readiness;
use crate::error::EngineError;
use async_trait::async_trait;

/// The document-automation capabilities the pipeline relies on.
///
/// Calls are issued from a single cooperative task, so implementations need
/// not be `Send`. Several reads may be in flight at once while a page is
/// being parsed; none of them mutate the document.
#[async_trait(?Send)]
pub trait AutomationEngine {
    /// Opaque reference to one element of the loaded document
    type Handle: Clone;

    /// Load `url` in the engine's page
    async fn navigate(&self, url: &str) -> Result<(), EngineError>;

    /// Wait until the loaded document reaches `level`
    async fn wait_ready(&self, level: Readiness) -> Result<(), EngineError>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Handle>, EngineError>;

    /// First descendant of `scope` matching `selector`
    async fn query_within(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, EngineError>;

    /// Element immediately following `handle` among its siblings
    async fn next_sibling(&self, handle: &Self::Handle) -> Result<Option<Self::Handle>, EngineError>;

    async fn read_text(&self, handle: &Self::Handle) -> Result<String, EngineError>;

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, EngineError>;

    async fn is_visible(&self, handle: &Self::Handle) -> Result<bool, EngineError>;

    /// Click-equivalent activation
    async fn activate(&self, handle: &Self::Handle) -> Result<(), EngineError>;
}
