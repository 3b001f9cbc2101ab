use std::time::Duration;
use thiserror::Error;

/// Errors raised by an automation engine while talking to the document
#[derive(Debug, Error)]
pub enum EngineError {
    /// The selector could not be compiled by the engine
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),

    /// The handle refers to a document that is no longer loaded
    #[error("stale element handle")]
    Stale,

    /// The engine refused or failed to execute a command
    #[error("engine command failed: {0}")]
    Command(String),

    /// A readiness wait gave up before the document settled
    #[error("document not ready after {0:?}")]
    NotReady(Duration),
}

/// Why a single row could not be turned into an entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowFault {
    #[error("no title anchor")]
    MissingAnchor,

    #[error("title anchor has no href")]
    MissingLink,

    #[error("no metadata row follows the title row")]
    MissingMetadata,

    #[error("no age indicator in the metadata row")]
    MissingAge,

    #[error("age indicator has no `{0}` attribute")]
    MissingTimestamp(String),

    #[error("unparsable timestamp `{0}`")]
    UnparsableTimestamp(String),
}

/// A row whose data is missing or malformed. Recovered by skipping the row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {index} on page {page}: {fault}")]
pub struct RowParseFailure {
    pub page: usize,
    /// Zero-based position of the row on its page
    pub index: usize,
    pub fault: RowFault,
}

/// The rows of a page could not be read at all
#[derive(Debug, Error)]
#[error("extraction of page {page} failed")]
pub struct PageExtractionFailure {
    pub page: usize,
    #[source]
    pub source: EngineError,
}

/// The starting URL could not be visited. Fatal for a run.
#[derive(Debug, Error)]
pub enum NavigationFailure {
    #[error("invalid start URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not load {url}")]
    Engine {
        url: String,
        #[source]
        source: EngineError,
    },

    #[error("loading {url} took longer than {after:?}")]
    TimedOut { url: String, after: Duration },
}

/// Revealing the next page took longer than the configured bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pagination did not settle within {after:?}")]
pub struct PaginationTimeout {
    pub after: Duration,
}

/// Failure to read or decode a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file")]
    Io(#[from] std::io::Error),

    #[error("malformed config")]
    Json(#[from] serde_json::Error),

    #[error("batch_width must be at least 1")]
    ZeroBatchWidth,

    #[error("navigation_timeout_secs must be at least 1")]
    ZeroNavigationTimeout,

    #[error("pagination_timeout_secs must be at least 1")]
    ZeroPaginationTimeout,
}
