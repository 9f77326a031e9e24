//! Rate-limit-aware trends retrieval.
//!
//! The trends bridge service enforces undocumented request-rate limits,
//! so every logical retrieval goes through [`TrendsClient`]: a settle
//! delay before each attempt, escalating backoff after a throttling
//! response, and an explicit empty default once attempts are exhausted.
//! This is the single retry authority in the system; no caller
//! re-retries.

use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure classes for external signal sources.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The upstream throttled the request. Transient; worth retrying
    /// with backoff.
    #[error("rate limited by upstream source")]
    RateLimited,

    /// The upstream was unreachable or returned unusable data.
    /// Permanent for this retrieval; retrying would not help.
    #[error("source failure: {0}")]
    Source(String),
}

/// Retry constants for one upstream source.
///
/// One policy instance is shared across all keywords of a run so the
/// settle/backoff cadence is per source, not per keyword. Tests inject
/// zero delays to stay deterministic without real sleeps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts per logical retrieval.
    pub attempts: u32,
    /// Fixed delay observed before every attempt to reduce rate-limit
    /// incidence.
    pub settle: Duration,
    /// Base unit of the escalating backoff: attempt `i` waits
    /// `(i + 1) * backoff_step` before the next try.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            settle: Duration::from_secs(2),
            backoff_step: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            attempts: 3,
            settle: Duration::ZERO,
            backoff_step: Duration::ZERO,
        }
    }

    fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_step * (attempt + 1)
    }
}

/// Abstraction over the trends data source, mockable in tests.
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Interest-over-time series for a keyword.
    async fn interest_over_time(&self, keyword: &str) -> Result<Vec<f64>, FetchError>;

    /// Rising related queries for a seed keyword.
    async fn rising_related(&self, keyword: &str) -> Result<Vec<String>, FetchError>;

    /// Daily trending searches for the configured region.
    async fn trending_daily(&self) -> Result<Vec<String>, FetchError>;

    /// Shopping-category chart entries for the configured region.
    async fn category_chart(&self) -> Result<Vec<String>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct InterestResponse {
    #[serde(default)]
    timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct RelatedResponse {
    #[serde(default)]
    rising: Vec<RelatedQuery>,
}

#[derive(Debug, Deserialize)]
struct RelatedQuery {
    query: String,
}

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    searches: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    items: Vec<ChartItem>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    title: String,
}

/// HTTP implementation of [`TrendSource`] against a trends bridge
/// service (pytrends-compatible JSON endpoints).
pub struct HttpTrendSource {
    http: reqwest::Client,
    base_url: String,
    geo: String,
    timeframe: String,
}

impl HttpTrendSource {
    pub fn new(http: reqwest::Client, base_url: String, geo: String, timeframe: String) -> Self {
        Self {
            http,
            base_url,
            geo,
            timeframe,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Source(format!("request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Source(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Source(format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl TrendSource for HttpTrendSource {
    async fn interest_over_time(&self, keyword: &str) -> Result<Vec<f64>, FetchError> {
        let body: InterestResponse = self
            .get_json(
                "interest_over_time",
                &[
                    ("q", keyword),
                    ("timeframe", &self.timeframe),
                    ("geo", &self.geo),
                ],
            )
            .await?;
        Ok(body.timeline.into_iter().map(|p| p.value).collect())
    }

    async fn rising_related(&self, keyword: &str) -> Result<Vec<String>, FetchError> {
        let body: RelatedResponse = self
            .get_json(
                "related_queries",
                &[
                    ("q", keyword),
                    ("timeframe", &self.timeframe),
                    ("geo", &self.geo),
                ],
            )
            .await?;
        Ok(body.rising.into_iter().map(|r| r.query).collect())
    }

    async fn trending_daily(&self) -> Result<Vec<String>, FetchError> {
        let body: TrendingResponse = self
            .get_json("trending_searches", &[("geo", &self.geo)])
            .await?;
        Ok(body.searches)
    }

    async fn category_chart(&self) -> Result<Vec<String>, FetchError> {
        let body: ChartResponse = self
            .get_json("top_charts", &[("geo", &self.geo), ("cid", "shopping")])
            .await?;
        Ok(body.items.into_iter().map(|i| i.title).collect())
    }
}

/// Retrying wrapper around a [`TrendSource`].
///
/// Rate-limit failures are retried up to the policy's attempt cap;
/// any other failure class immediately degrades to the empty default.
/// Errors never propagate past this boundary.
pub struct TrendsClient {
    source: Arc<dyn TrendSource>,
    policy: RetryPolicy,
    related_limit: usize,
}

impl TrendsClient {
    pub fn new(source: Arc<dyn TrendSource>, policy: RetryPolicy, related_limit: usize) -> Self {
        Self {
            source,
            policy,
            related_limit,
        }
    }

    /// Interest-over-time series for a keyword; empty on exhaustion.
    pub async fn fetch_series(&self, keyword: &str) -> Vec<f64> {
        let source = &self.source;
        self.retry(keyword, "interest_over_time", || {
            source.interest_over_time(keyword)
        })
        .await
        .unwrap_or_default()
    }

    /// Rising related queries, truncated to the configured limit; empty
    /// on exhaustion.
    pub async fn fetch_rising(&self, keyword: &str) -> Vec<String> {
        let source = &self.source;
        let mut related = self
            .retry(keyword, "related_queries", || source.rising_related(keyword))
            .await
            .unwrap_or_default();
        related.truncate(self.related_limit);
        related
    }

    /// Daily trending searches. A single attempt; failures degrade to
    /// an empty list so discovery can continue on the other sub-source.
    pub async fn fetch_trending(&self) -> Vec<String> {
        match self.source.trending_daily().await {
            Ok(searches) => searches,
            Err(e) => {
                warn!("trending searches unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Shopping-category chart. Same degradation rules as
    /// [`fetch_trending`](Self::fetch_trending).
    pub async fn fetch_chart(&self) -> Vec<String> {
        match self.source.category_chart().await {
            Ok(items) => items,
            Err(e) => {
                warn!("category chart unavailable: {}", e);
                Vec::new()
            }
        }
    }

    async fn retry<T, Fut, F>(&self, keyword: &str, op: &str, mut call: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        for attempt in 0..self.policy.attempts {
            tokio::time::sleep(self.policy.settle).await;

            match call().await {
                Ok(value) => return Some(value),
                Err(FetchError::RateLimited) => {
                    warn!(
                        "{} rate limited for '{}' (attempt {}/{})",
                        op,
                        keyword,
                        attempt + 1,
                        self.policy.attempts
                    );
                    if attempt + 1 < self.policy.attempts {
                        tokio::time::sleep(self.policy.backoff_after(attempt)).await;
                    }
                }
                Err(FetchError::Source(reason)) => {
                    // Permanent failure class: retrying a malformed or
                    // unavailable source wastes the rate budget.
                    warn!("{} failed for '{}': {}", op, keyword, reason);
                    return None;
                }
            }
        }

        warn!(
            "{} exhausted {} attempts for '{}'",
            op, self.policy.attempts, keyword
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Source that replays a scripted outcome sequence for the series
    /// endpoint and counts every call.
    struct ScriptedSource {
        series_outcomes: Mutex<VecDeque<Result<Vec<f64>, FetchError>>>,
        related: Vec<String>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Vec<f64>, FetchError>>) -> Self {
            Self {
                series_outcomes: Mutex::new(outcomes.into()),
                related: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_related(related: Vec<String>) -> Self {
            Self {
                series_outcomes: Mutex::new(VecDeque::new()),
                related,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TrendSource for ScriptedSource {
        async fn interest_over_time(&self, _keyword: &str) -> Result<Vec<f64>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.series_outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(FetchError::RateLimited))
        }

        async fn rising_related(&self, _keyword: &str) -> Result<Vec<String>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.related.clone())
        }

        async fn trending_daily(&self) -> Result<Vec<String>, FetchError> {
            Err(FetchError::Source("not scripted".to_string()))
        }

        async fn category_chart(&self) -> Result<Vec<String>, FetchError> {
            Err(FetchError::Source("not scripted".to_string()))
        }
    }

    fn client(source: Arc<ScriptedSource>) -> TrendsClient {
        TrendsClient::new(source, RetryPolicy::immediate(), 10)
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_third_attempt() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Ok(vec![1.0, 2.0, 3.0]),
        ]));
        let client = client(source.clone());

        let series = client.fetch_series("yoga mat").await;
        assert_eq!(series, vec![1.0, 2.0, 3.0]);
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_returns_empty_default() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
            Err(FetchError::RateLimited),
        ]));
        let client = client(source.clone());

        let series = client.fetch_series("yoga mat").await;
        assert!(series.is_empty());
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_source_failure_is_not_retried() {
        let source = Arc::new(ScriptedSource::new(vec![Err(FetchError::Source(
            "malformed response".to_string(),
        ))]));
        let client = client(source.clone());

        let series = client.fetch_series("yoga mat").await;
        assert!(series.is_empty());
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rising_related_truncated_to_limit() {
        let related: Vec<String> = (0..25).map(|i| format!("kw{}", i)).collect();
        let source = Arc::new(ScriptedSource::with_related(related));
        let client = client(source);

        let rising = client.fetch_rising("yoga mat").await;
        assert_eq!(rising.len(), 10);
        assert_eq!(rising[0], "kw0");
    }

    #[tokio::test]
    async fn test_trending_failure_degrades_to_empty() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let client = client(source);

        assert!(client.fetch_trending().await.is_empty());
        assert!(client.fetch_chart().await.is_empty());
    }
}
