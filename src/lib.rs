pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod hooks;
pub mod listing;
pub mod report;

// Re-export commonly used types for convenience
pub use config::{ListingConfig, Readiness, Selectors};
pub use engine::AutomationEngine;
pub use entry::Entry;
pub use hooks::{LoggingHook, Metrics, MetricsSnapshot, PipelineHook};
pub use listing::pipeline::{Harvest, Pipeline, Termination};

/// Most entries a run will gather
pub const MAX_ENTRIES: usize = 100;

/// Most pages a run will read. The listing shows 30 rows per page, so four
/// pages are enough to reach [`MAX_ENTRIES`].
pub const MAX_PAGE_CYCLES: usize = 4;
