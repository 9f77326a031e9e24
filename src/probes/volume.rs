//! Search volume estimation.
//!
//! Queries an external keyword SERP API for an estimated monthly
//! search volume and clamps it to the configured cap so downstream
//! normalization stays bounded.

use crate::trends::FetchError;
use serde::Deserialize;
use tracing::debug;

/// Clamp a raw volume estimate to `[0, max_vol]`.
pub fn clamp_volume(raw: u64, max_vol: u64) -> u64 {
    raw.min(max_vol)
}

/// Normalize a clamped volume into `[0, 1]`.
pub fn normalize_volume(volume: u64, max_vol: u64) -> f64 {
    if max_vol == 0 {
        return 0.0;
    }
    volume as f64 / max_vol as f64
}

#[derive(Debug, Deserialize)]
struct VolumeResponse {
    #[serde(default)]
    search_volume: u64,
}

/// Client for the keyword SERP volume API.
pub struct VolumeClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_vol: u64,
}

impl VolumeClient {
    pub fn new(http: reqwest::Client, endpoint: String, api_key: String, max_vol: u64) -> Self {
        Self {
            http,
            endpoint,
            api_key,
            max_vol,
        }
    }

    /// Estimated search volume for a keyword, clamped to the cap.
    /// A missing `search_volume` field counts as 0.
    pub async fn search_volume(&self, keyword: &str) -> Result<u64, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str()), ("q", keyword)])
            .send()
            .await
            .map_err(|e| FetchError::Source(format!("volume request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Source(format!(
                "volume API status {}",
                response.status()
            )));
        }

        let body: VolumeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Source(format!("volume response malformed: {}", e)))?;

        let clamped = clamp_volume(body.search_volume, self.max_vol);
        debug!(
            "volume for '{}': raw {}, clamped {}",
            keyword, body.search_volume, clamped
        );
        Ok(clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_above_cap() {
        assert_eq!(clamp_volume(150_000, 100_000), 100_000);
    }

    #[test]
    fn test_clamp_below_cap() {
        assert_eq!(clamp_volume(42_000, 100_000), 42_000);
    }

    #[test]
    fn test_normalize_capped_volume_is_one() {
        let clamped = clamp_volume(150_000, 100_000);
        assert_eq!(normalize_volume(clamped, 100_000), 1.0);
    }

    #[test]
    fn test_normalize_is_bounded() {
        assert_eq!(normalize_volume(0, 100_000), 0.0);
        assert_eq!(normalize_volume(50_000, 100_000), 0.5);
    }

    #[test]
    fn test_normalize_zero_cap_guard() {
        assert_eq!(normalize_volume(10, 0), 0.0);
    }

    #[test]
    fn test_volume_response_defaults_missing_field() {
        let body: VolumeResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.search_volume, 0);
    }
}
