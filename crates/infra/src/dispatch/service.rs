//! Query dispatch service

use std::sync::Mutex;
use std::time::Duration;

use chaff_core::random::{self, RandomSource};
use chaff_domain::constants::{THINK_TIME_MAX_MS, THINK_TIME_MIN_MS};
use chaff_domain::{ChaffError, DispatchStats, HttpConfig, Result, SearchEngine};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, StatusCode};
use tracing::{debug, warn};

use super::failure::FailureTracker;
use super::profile;

/// Configuration for the query dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Timeout for outbound requests.
    pub timeout: Duration,
    /// User agent presented on every request.
    pub user_agent: String,
    /// Route all search traffic to this base URL instead of the engine's
    /// real endpoint. Test hook; leave unset in production.
    pub endpoint_override: Option<String>,
    /// Pre-click think-time range in milliseconds.
    pub think_time_ms: (u64, u64),
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        let http = HttpConfig::default();
        Self {
            timeout: Duration::from_secs(http.timeout_seconds),
            user_agent: http.user_agent,
            endpoint_override: None,
            think_time_ms: (THINK_TIME_MIN_MS, THINK_TIME_MAX_MS),
        }
    }
}

impl DispatcherConfig {
    /// Derive dispatcher settings from the runtime HTTP configuration.
    pub fn from_http(http: &HttpConfig) -> Self {
        Self {
            timeout: Duration::from_secs(http.timeout_seconds),
            user_agent: http.user_agent.clone(),
            endpoint_override: http.endpoint_override.clone(),
            think_time_ms: (THINK_TIME_MIN_MS, THINK_TIME_MAX_MS),
        }
    }
}

/// Result of one outbound query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success { status: u16, url: String },
    Failure { error: String },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The search URL, if the dispatch reached the remote successfully.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Success { url, .. } => Some(url),
            Self::Failure { .. } => None,
        }
    }
}

/// Result of one simulated result click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub success: bool,
    pub dwell: Duration,
    pub error: Option<String>,
}

/// Outbound request dispatcher with failure tracking.
///
/// All methods take `&self`; the failure tracker and random source sit
/// behind short-lived locks so the dispatcher can be shared with the
/// control surface while the engine loop runs.
pub struct QueryDispatcher {
    client: ReqwestClient,
    config: DispatcherConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    failures: Mutex<FailureTracker>,
}

impl QueryDispatcher {
    /// Build a dispatcher with a cookie-carrying, redirect-following client.
    pub fn new(config: DispatcherConfig, rng: Box<dyn RandomSource>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .map_err(|err| ChaffError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            config,
            rng: Mutex::new(rng),
            failures: Mutex::new(FailureTracker::new()),
        })
    }

    /// Issue one search query.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// outcome and recorded against the failure tracker.
    pub async fn execute_query(&self, engine: SearchEngine, query: &str) -> DispatchOutcome {
        let referrer = self.draw(|rng| profile::referrer(rng, engine));
        let url = self.build_search_url(engine, query);
        let headers = header_map(profile::navigation_headers(Some(&referrer)));

        debug!(%url, %referrer, "dispatching search query");

        match self.client.get(&url).headers(headers).send().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    warn!(%url, "rate limited by search engine, backing off");
                    self.with_failures(|f| f.record_rate_limit(Utc::now()));
                    DispatchOutcome::Failure { error: "rate limited".to_string() }
                } else if !status.is_success() {
                    self.with_failures(|f| f.record_failure(Utc::now()));
                    DispatchOutcome::Failure { error: format!("HTTP {}", status.as_u16()) }
                } else {
                    self.with_failures(|f| f.record_success(Utc::now()));
                    DispatchOutcome::Success { status: status.as_u16(), url }
                }
            }
            Err(err) => {
                self.with_failures(|f| f.record_failure(Utc::now()));
                DispatchOutcome::Failure { error: err.to_string() }
            }
        }
    }

    /// Simulate clicking through to a result page.
    ///
    /// Waits a scan-the-results think time, fetches the page with the search
    /// URL as referrer, then dwells. Failures are swallowed into the
    /// outcome; they do not count against the failure tracker, matching how
    /// an abandoned click costs a real user nothing.
    pub async fn simulate_result_click(
        &self,
        result_url: &str,
        search_url: &str,
        dwell: Duration,
    ) -> ClickOutcome {
        let (min_think, max_think) = self.config.think_time_ms;
        let think_ms =
            self.draw(|rng| random::uniform_range(rng, min_think as f64, max_think as f64));
        tokio::time::sleep(Duration::from_millis(think_ms as u64)).await;

        let mut headers = header_map(profile::navigation_headers(Some(search_url)));
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("cross-site"),
        );

        debug!(%result_url, dwell_ms = dwell.as_millis() as u64, "simulating result click");

        let fetched = self.client.get(result_url).headers(headers).send().await;
        match fetched {
            Ok(response) => {
                let success = response.status().is_success();
                tokio::time::sleep(dwell).await;
                ClickOutcome { success, dwell, error: None }
            }
            Err(err) => {
                ClickOutcome { success: false, dwell, error: Some(err.to_string()) }
            }
        }
    }

    /// Sampled rank for the next simulated click.
    pub fn result_position(&self) -> u32 {
        self.draw(profile::result_position)
    }

    /// Plausible destination URL for a simulated click on `query`.
    pub fn mock_result_url(&self, query: &str, position: u32) -> String {
        self.draw(|rng| profile::mock_result_url(rng, query, position))
    }

    /// Current backoff multiplier, applied by the orchestrator to pacing
    /// delays.
    pub fn backoff_multiplier(&self) -> f64 {
        self.with_failures(|f| f.backoff_multiplier())
    }

    /// Whether failures have piled up enough to pause the engine.
    pub fn should_pause(&self) -> bool {
        self.with_failures(|f| f.should_pause(Utc::now()))
    }

    pub fn stats(&self) -> DispatchStats {
        self.with_failures(|f| f.stats())
    }

    fn build_search_url(&self, engine: SearchEngine, query: &str) -> String {
        match &self.config.endpoint_override {
            Some(base) => {
                format!("{}/search?q={}", base.trim_end_matches('/'), urlencoding::encode(query))
            }
            None => profile::search_url(engine, query),
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut dyn RandomSource) -> T) -> T {
        let mut guard = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(guard.as_mut())
    }

    fn with_failures<T>(&self, f: impl FnOnce(&mut FailureTracker) -> T) -> T {
        let mut guard = match self.failures.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

fn header_map(pairs: Vec<(&'static str, String)>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else { continue };
        let Ok(value) = HeaderValue::from_str(&value) else { continue };
        map.insert(name, value);
    }
    map
}
