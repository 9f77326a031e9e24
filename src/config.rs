//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.demandscout.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Trends bridge settings.
    #[serde(default)]
    pub trends: TrendsConfig,

    /// Search volume API settings.
    #[serde(default)]
    pub volume: VolumeConfig,

    /// Marketplace supply probe settings.
    #[serde(default)]
    pub marketplace: MarketplaceConfig,

    /// Video platform API settings.
    #[serde(default)]
    pub social: SocialConfig,

    /// Scoring weights and thresholds.
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Alert webhook settings.
    #[serde(default)]
    pub alert: AlertConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output CSV path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Delay between keywords, in seconds.
    #[serde(default = "default_delay")]
    pub delay_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            delay_seconds: default_delay(),
        }
    }
}

fn default_output() -> String {
    "demand_metrics.csv".to_string()
}

fn default_delay() -> u64 {
    1
}

/// Trends bridge service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    /// Trends bridge URL (pytrends-compatible JSON endpoints).
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Region code for trending and interest queries.
    #[serde(default = "default_geo")]
    pub geo: String,

    /// Interest-over-time window.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// Retry attempts per retrieval.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Settling delay before every attempt, in seconds.
    #[serde(default = "default_settle")]
    pub settle_seconds: u64,

    /// Backoff step after a throttling response, in seconds.
    #[serde(default = "default_backoff")]
    pub backoff_seconds: u64,

    /// Seeds taken from each trending sub-source.
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,

    /// Rising related queries kept per seed.
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            geo: default_geo(),
            timeframe: default_timeframe(),
            attempts: default_attempts(),
            settle_seconds: default_settle(),
            backoff_seconds: default_backoff(),
            trending_limit: default_trending_limit(),
            related_limit: default_related_limit(),
        }
    }
}

fn default_bridge_url() -> String {
    "http://localhost:8950".to_string()
}

fn default_geo() -> String {
    "IN".to_string()
}

fn default_timeframe() -> String {
    "today 12-m".to_string()
}

fn default_attempts() -> u32 {
    3
}

fn default_settle() -> u64 {
    2
}

fn default_backoff() -> u64 {
    30
}

fn default_trending_limit() -> usize {
    20
}

fn default_related_limit() -> usize {
    10
}

/// Search volume API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Volume estimate endpoint.
    #[serde(default = "default_volume_endpoint")]
    pub endpoint: String,

    /// API key for the volume endpoint.
    #[serde(default = "default_volume_key")]
    pub api_key: String,

    /// Volume cap bounding downstream normalization.
    #[serde(default = "default_max_vol")]
    pub max_vol: u64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_volume_endpoint(),
            api_key: default_volume_key(),
            max_vol: default_max_vol(),
        }
    }
}

fn default_volume_endpoint() -> String {
    "https://api.keywordserp.com/search".to_string()
}

fn default_volume_key() -> String {
    "demo".to_string()
}

fn default_max_vol() -> u64 {
    100_000
}

/// Marketplace supply probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Search results page URL; the keyword goes in the `k` parameter.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// User-Agent header for page fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Listings sampled for the review-proxy average.
    #[serde(default = "default_sample_top")]
    pub sample_top: usize,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            user_agent: default_user_agent(),
            sample_top: default_sample_top(),
        }
    }
}

fn default_search_url() -> String {
    "https://www.amazon.in/s".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_sample_top() -> usize {
    5
}

/// Video platform API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Data API base URL.
    #[serde(default = "default_social_endpoint")]
    pub endpoint: String,

    /// API key; empty disables the social probe.
    #[serde(default)]
    pub api_key: String,

    /// Search results summed into the proxy.
    #[serde(default = "default_top_results")]
    pub top_results: usize,

    /// Divisor scaling the view sum down to a bounded-ish proxy.
    #[serde(default = "default_view_scale")]
    pub view_scale: f64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            endpoint: default_social_endpoint(),
            api_key: String::new(),
            top_results: default_top_results(),
            view_scale: default_view_scale(),
        }
    }
}

fn default_social_endpoint() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_top_results() -> usize {
    3
}

fn default_view_scale() -> f64 {
    1e5
}

/// Scoring weights and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Discover-mode trend weight.
    #[serde(default = "default_trend_weight")]
    pub trend_weight: f64,

    /// Discover-mode volume weight.
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,

    /// Monitor-mode trend weight.
    #[serde(default = "default_momentum_trend")]
    pub momentum_trend_weight: f64,

    /// Monitor-mode review velocity weight.
    #[serde(default = "default_momentum_velocity")]
    pub momentum_velocity_weight: f64,

    /// Monitor-mode social weight.
    #[serde(default = "default_momentum_social")]
    pub momentum_social_weight: f64,

    /// Review velocity normalization divisor.
    #[serde(default = "default_velocity_norm")]
    pub velocity_norm: f64,

    /// Demand score at or above which an alert fires.
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trend_weight: default_trend_weight(),
            volume_weight: default_volume_weight(),
            momentum_trend_weight: default_momentum_trend(),
            momentum_velocity_weight: default_momentum_velocity(),
            momentum_social_weight: default_momentum_social(),
            velocity_norm: default_velocity_norm(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

fn default_trend_weight() -> f64 {
    0.6
}

fn default_volume_weight() -> f64 {
    0.4
}

fn default_momentum_trend() -> f64 {
    0.4
}

fn default_momentum_velocity() -> f64 {
    0.3
}

fn default_momentum_social() -> f64 {
    0.3
}

fn default_velocity_norm() -> f64 {
    500.0
}

fn default_alert_threshold() -> f64 {
    0.8
}

/// Alert webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Webhook URL; absent disables alerting.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".demandscout.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; optional
    /// arguments only override when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Output always overrides since the CLI carries a default.
        self.general.output = args.output.display().to_string();

        if let Some(delay) = args.delay {
            self.general.delay_seconds = delay;
        }
        if let Some(ref geo) = args.geo {
            self.trends.geo = geo.clone();
        }
        if let Some(threshold) = args.threshold {
            self.scoring.alert_threshold = threshold;
        }
        if let Some(ref url) = args.webhook_url {
            self.alert.webhook_url = Some(url.clone());
        }
        if let Some(ref key) = args.volume_api_key {
            self.volume.api_key = key.clone();
        }
        if let Some(ref key) = args.social_api_key {
            self.social.api_key = key.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.trends.geo, "IN");
        assert_eq!(config.trends.attempts, 3);
        assert_eq!(config.volume.max_vol, 100_000);
        assert_eq!(config.scoring.trend_weight, 0.6);
        assert_eq!(config.scoring.alert_threshold, 0.8);
        assert!(config.alert.webhook_url.is_none());
    }

    #[test]
    fn test_discover_weights_sum_to_one() {
        let config = Config::default();
        let sum = config.scoring.trend_weight + config.scoring.volume_weight;
        assert!((sum - 1.0).abs() < 1e-12);

        let momentum_sum = config.scoring.momentum_trend_weight
            + config.scoring.momentum_velocity_weight
            + config.scoring.momentum_social_weight;
        assert!((momentum_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom.csv"
delay_seconds = 0

[trends]
geo = "US"
backoff_seconds = 5

[scoring]
alert_threshold = 0.5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom.csv");
        assert_eq!(config.general.delay_seconds, 0);
        assert_eq!(config.trends.geo, "US");
        assert_eq!(config.trends.backoff_seconds, 5);
        // Unset sections keep their defaults.
        assert_eq!(config.trends.attempts, 3);
        assert_eq!(config.scoring.alert_threshold, 0.5);
        assert_eq!(config.volume.max_vol, 100_000);
    }

    #[test]
    fn test_parse_config_ignores_unknown_keys() {
        // Keys from older config files parse without error.
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.general.delay_seconds, 1);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[trends]"));
        assert!(toml_str.contains("[scoring]"));
    }
}
