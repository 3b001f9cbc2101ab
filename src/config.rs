use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// How settled the document must be before the pipeline queries it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// DOM parsed and queryable; images and other media may still be loading
    #[default]
    Structural,
    /// Every resource of the page has finished loading
    Full,
}

/// CSS selectors and attribute names describing the listing markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// One title row per listed item
    #[serde(default = "default_row_selector")]
    pub row: String,

    /// Item anchor, looked up inside the title row
    #[serde(default = "default_title_selector")]
    pub title: String,

    /// Age indicator, looked up inside the metadata row
    #[serde(default = "default_age_selector")]
    pub age: String,

    /// The "load more" control
    #[serde(default = "default_more_selector")]
    pub more: String,

    /// Attribute of the age indicator holding the absolute timestamp
    #[serde(default = "default_timestamp_attribute")]
    pub timestamp_attribute: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            row: default_row_selector(),
            title: default_title_selector(),
            age: default_age_selector(),
            more: default_more_selector(),
            timestamp_attribute: default_timestamp_attribute(),
        }
    }
}

/// Configuration for a listing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Listing page to start from
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum number of row parses in flight at once
    #[serde(default = "default_batch_width")]
    pub batch_width: usize,

    /// Readiness level awaited after navigation and pagination
    #[serde(default)]
    pub readiness: Readiness,

    /// Bound on the initial page load, in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Bound on activating "load more" and waiting for the new rows, in seconds
    #[serde(default = "default_pagination_timeout")]
    pub pagination_timeout_secs: u64,

    /// Ask the browser to run without a window
    #[serde(default)]
    pub headless: bool,

    #[serde(default)]
    pub selectors: Selectors,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            webdriver_url: default_webdriver_url(),
            batch_width: default_batch_width(),
            readiness: Readiness::default(),
            navigation_timeout_secs: default_navigation_timeout(),
            pagination_timeout_secs: default_pagination_timeout(),
            headless: false,
            selectors: Selectors::default(),
        }
    }
}

impl ListingConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_width == 0 {
            return Err(ConfigError::ZeroBatchWidth);
        }
        if self.navigation_timeout_secs == 0 {
            return Err(ConfigError::ZeroNavigationTimeout);
        }
        if self.pagination_timeout_secs == 0 {
            return Err(ConfigError::ZeroPaginationTimeout);
        }
        Ok(())
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn pagination_timeout(&self) -> Duration {
        Duration::from_secs(self.pagination_timeout_secs)
    }
}

fn default_start_url() -> String {
    "https://news.ycombinator.com/newest".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_batch_width() -> usize {
    5
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_pagination_timeout() -> u64 {
    10
}

fn default_row_selector() -> String {
    "tr.athing".to_string()
}

fn default_title_selector() -> String {
    "span.titleline > a".to_string()
}

fn default_age_selector() -> String {
    "span.age".to_string()
}

fn default_more_selector() -> String {
    "a.morelink".to_string()
}

fn default_timestamp_attribute() -> String {
    "title".to_string()
}
