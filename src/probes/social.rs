//! Social growth proxy.
//!
//! Searches a video platform API for the keyword, sums view counts of
//! the top results, and scales the sum down to a bounded-ish proxy.
//! API errors here are hard external failures for this probe (the
//! platform enforces its own quota semantics); the pipeline degrades
//! them, this probe does not retry.

use crate::trends::FetchError;
use futures::future::join_all;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoRef,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    items: Vec<StatsItem>,
}

#[derive(Debug, Deserialize)]
struct StatsItem {
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    /// The API reports counts as decimal strings.
    #[serde(rename = "viewCount", default)]
    view_count: String,
}

/// Parse an API view count, treating anything unparseable as zero.
pub fn parse_views(raw: &str) -> u64 {
    raw.parse().unwrap_or(0)
}

/// Client for the video platform data API.
pub struct SocialClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    top_results: usize,
    view_scale: f64,
}

impl SocialClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: String,
        api_key: String,
        top_results: usize,
        view_scale: f64,
    ) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            top_results,
            view_scale,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Source(format!("video API request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FetchError::Source(format!(
                "video API status {}",
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Source(format!("video API response malformed: {}", e)))
    }

    async fn video_views(&self, video_id: &str) -> Result<u64, FetchError> {
        let stats: StatsResponse = self
            .get_json("videos", &[("part", "statistics"), ("id", video_id)])
            .await?;
        Ok(stats
            .items
            .first()
            .map(|item| parse_views(&item.statistics.view_count))
            .unwrap_or(0))
    }

    /// Summed view counts of the top search results, divided by the
    /// configured scale.
    pub async fn growth_proxy(&self, keyword: &str) -> Result<f64, FetchError> {
        let max_results = self.top_results.to_string();
        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "id"),
                    ("type", "video"),
                    ("q", keyword),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .take(self.top_results)
            .map(|item| item.id.video_id)
            .collect();

        // The per-video statistics lookups are independent.
        let lookups = join_all(ids.iter().map(|id| self.video_views(id))).await;
        let mut total: u64 = 0;
        for views in lookups {
            total += views?;
        }

        let proxy = total as f64 / self.view_scale;
        debug!("social proxy for '{}': {} views -> {}", keyword, total, proxy);
        Ok(proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_views() {
        assert_eq!(parse_views("123456"), 123_456);
        assert_eq!(parse_views(""), 0);
        assert_eq!(parse_views("n/a"), 0);
    }

    #[test]
    fn test_search_response_shape() {
        let json = r#"{"items":[{"id":{"videoId":"abc123"}},{"id":{"videoId":"def456"}}]}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].id.video_id, "abc123");
    }

    #[test]
    fn test_stats_response_missing_view_count() {
        let json = r#"{"items":[{"statistics":{}}]}"#;
        let parsed: StatsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parse_views(&parsed.items[0].statistics.view_count), 0);
    }
}
