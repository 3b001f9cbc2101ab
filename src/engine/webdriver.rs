use crate::engine::{AutomationEngine, Readiness};
use crate::error::EngineError;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Automation engine backed by a WebDriver session
pub struct WebDriverEngine {
    client: Client,
    ready_timeout: Duration,
}

impl WebDriverEngine {
    /// Wrap an already established session
    pub fn new(client: Client) -> Self {
        Self {
            client,
            ready_timeout: Duration::from_secs(30),
        }
    }

    /// Bound on a single readiness wait
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Connects to the WebDriver instance, trying common local ports if the
    /// configured one is unreachable
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, NewSessionError> {
        let mut builder = ClientBuilder::native();
        if headless {
            builder.capabilities(headless_capabilities());
        }

        let first_error = match builder.connect(webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", webdriver_url);
                return Ok(Self::new(client));
            }
            Err(e) => {
                ::log::warn!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                e
            }
        };

        let fallback_urls = [
            "http://localhost:9515", // ChromeDriver default
            "http://localhost:4444", // geckodriver / Selenium default
            "http://127.0.0.1:4444",
        ];

        for url in fallback_urls.iter() {
            if *url == webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = builder.connect(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(Self::new(client));
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(first_error)
    }

    /// End the WebDriver session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    async fn ready_state(&self) -> Result<String, EngineError> {
        let state = self
            .client
            .execute("return document.readyState;", Vec::new())
            .await
            .map_err(|e| command_error(e, "reading readyState"))?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }
}

fn headless_capabilities() -> serde_json::Map<String, Value> {
    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": ["--headless=new", "--disable-gpu"] }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({ "args": ["-headless"] }),
    );
    caps
}

/// Whether a `document.readyState` value satisfies the requested level
fn ready_state_satisfies(state: &str, level: Readiness) -> bool {
    match level {
        Readiness::Structural => state == "interactive" || state == "complete",
        Readiness::Full => state == "complete",
    }
}

/// Maps a WebDriver command error, calling out lost sessions
fn command_error(error: CmdError, context: &str) -> EngineError {
    if error.is_invalid_session_id() {
        ::log::warn!("Lost WebDriver session while {}", context);
    } else {
        ::log::debug!("WebDriver command failed while {}: {}", context, error);
    }
    EngineError::Command(format!("{}: {}", context, error))
}

fn stale_or_command(error: CmdError, context: &str) -> EngineError {
    if error.is_stale_element_reference() {
        EngineError::Stale
    } else {
        command_error(error, context)
    }
}

/// A lookup that found nothing is `None`, not an error
fn found<T>(result: Result<T, CmdError>, context: &str) -> Result<Option<T>, EngineError> {
    match result {
        Ok(element) => Ok(Some(element)),
        Err(e) if e.is_no_such_element() => Ok(None),
        Err(e) => Err(stale_or_command(e, context)),
    }
}

#[async_trait(?Send)]
impl AutomationEngine for WebDriverEngine {
    type Handle = Element;

    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        ::log::debug!("GOTO: {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|e| command_error(e, "navigating"))
    }

    async fn wait_ready(&self, level: Readiness) -> Result<(), EngineError> {
        let started = Instant::now();
        loop {
            let state = self.ready_state().await?;
            if ready_state_satisfies(&state, level) {
                ::log::trace!("Document {} after {:?}", state, started.elapsed());
                return Ok(());
            }
            if started.elapsed() >= self.ready_timeout {
                return Err(EngineError::NotReady(self.ready_timeout));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, EngineError> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| command_error(e, "querying rows"))
    }

    async fn query_within(
        &self,
        scope: &Element,
        selector: &str,
    ) -> Result<Option<Element>, EngineError> {
        found(
            scope.find(Locator::Css(selector)).await,
            "querying within element",
        )
    }

    async fn next_sibling(&self, handle: &Element) -> Result<Option<Element>, EngineError> {
        found(
            handle.find(Locator::XPath("./following-sibling::*[1]")).await,
            "locating sibling",
        )
    }

    async fn read_text(&self, handle: &Element) -> Result<String, EngineError> {
        handle
            .text()
            .await
            .map_err(|e| stale_or_command(e, "reading text"))
    }

    async fn read_attribute(
        &self,
        handle: &Element,
        name: &str,
    ) -> Result<Option<String>, EngineError> {
        handle
            .attr(name)
            .await
            .map_err(|e| stale_or_command(e, "reading attribute"))
    }

    async fn is_visible(&self, handle: &Element) -> Result<bool, EngineError> {
        handle
            .is_displayed()
            .await
            .map_err(|e| stale_or_command(e, "checking visibility"))
    }

    async fn activate(&self, handle: &Element) -> Result<(), EngineError> {
        // WebDriver's click waits for a navigation it triggers to be committed
        handle
            .clone()
            .click()
            .await
            .map(|_| ())
            .map_err(|e| stale_or_command(e, "clicking"))
    }
}
