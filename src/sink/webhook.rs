//! Fire-and-forget webhook alerts.
//!
//! High-momentum keywords trigger a one-shot notification. Delivery is
//! best effort: every failure maps to an explicit [`DeliveryOutcome::Ignored`]
//! rather than an error, so the alerting boundary can never abort a run.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one best-effort delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The receiver acknowledged the alert.
    Delivered,
    /// The alert was dropped; the reason is logged and nothing retries.
    Ignored(String),
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    keyword: &'a str,
    score: f64,
}

/// Posts `{"keyword": ..., "score": ...}` to a configured webhook URL.
pub struct AlertSender {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl AlertSender {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self {
            http,
            url,
            timeout: Duration::from_secs(5),
        }
    }

    /// Send one alert. Never fails; failures become `Ignored`.
    pub async fn send(&self, keyword: &str, score: f64) -> DeliveryOutcome {
        let payload = AlertPayload { keyword, score };

        let result = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("alert delivered for '{}' (score {})", keyword, score);
                DeliveryOutcome::Delivered
            }
            Ok(response) => {
                let reason = format!("webhook status {}", response.status());
                warn!("alert for '{}' ignored: {}", keyword, reason);
                DeliveryOutcome::Ignored(reason)
            }
            Err(e) => {
                let reason = format!("webhook send failed: {}", e);
                warn!("alert for '{}' ignored: {}", keyword, reason);
                DeliveryOutcome::Ignored(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = AlertPayload {
            keyword: "yoga mat",
            score: 0.83,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"keyword":"yoga mat","score":0.83}"#);
    }

    #[tokio::test]
    async fn test_invalid_url_is_ignored_not_fatal() {
        let sender = AlertSender::new(reqwest::Client::new(), "not a url".to_string());
        match sender.send("yoga mat", 0.9).await {
            DeliveryOutcome::Ignored(reason) => assert!(reason.contains("webhook send failed")),
            DeliveryOutcome::Delivered => panic!("delivery to an invalid URL cannot succeed"),
        }
    }
}
