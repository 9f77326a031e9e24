//! Marketplace supply probing.
//!
//! Fetches a marketplace search-results page and extracts two things
//! from the markup: how many listings compete for the keyword, and a
//! review-count proxy averaged over the top listings. The extraction
//! is deliberately tolerant: it depends on third-party markup, so each
//! listing block is parsed in isolation and malformed blocks are
//! skipped rather than discarding the whole page.

use crate::models::SupplySnapshot;
use crate::trends::FetchError;
use tracing::debug;

/// Attribute marking one organic search-result block.
const LISTING_MARKER: &str = "data-component-type=\"s-search-result\"";

/// Split a results page into per-listing markup blocks.
fn listing_blocks(html: &str) -> Vec<&str> {
    html.split(LISTING_MARKER).skip(1).collect()
}

/// Extract the review count from one listing block.
///
/// The count lives in an `a-link-normal` anchor inside the block's
/// `a-size-small` row. Any structural mismatch or non-numeric text
/// yields `None` for this block only.
fn block_review_count(block: &str) -> Option<f64> {
    let section = &block[block.find("a-size-small")?..];
    let anchor = &section[section.find("a-link-normal")?..];
    let after_open = &anchor[anchor.find('>')? + 1..];
    let text = after_open[..after_open.find('<')?].trim().replace(',', "");

    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u64>().ok().map(|n| n as f64)
}

/// Count listings and average the review proxies of the sampled top
/// blocks. Pure; exercised directly by the markup fixtures in tests.
pub fn extract_supply(html: &str, sample_top: usize) -> SupplySnapshot {
    let blocks = listing_blocks(html);
    let counts: Vec<f64> = blocks
        .iter()
        .take(sample_top)
        .filter_map(|block| block_review_count(block))
        .collect();

    let avg_review_proxy = if counts.is_empty() {
        0.0
    } else {
        counts.iter().sum::<f64>() / counts.len() as f64
    };

    SupplySnapshot {
        listing_count: blocks.len(),
        avg_review_proxy,
    }
}

/// All pure-numeric `<span>` texts on the page, comma-separators
/// stripped. Nested or non-numeric spans are skipped.
fn numeric_span_values(html: &str) -> Vec<u64> {
    let mut values = Vec::new();
    let mut rest = html;

    while let Some(start) = rest.find("<span") {
        rest = &rest[start..];
        let Some(open_end) = rest.find('>') else { break };
        let after = &rest[open_end + 1..];
        let Some(close) = after.find("</span>") else { break };

        let text = after[..close].trim().replace(',', "");
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = text.parse::<u64>() {
                values.push(n);
            }
        }
        rest = &after[close..];
    }

    values
}

/// Sum of the `top` largest numeric span values on the page; the
/// monitor-mode review velocity proxy.
pub fn extract_velocity(html: &str, top: usize) -> f64 {
    let mut values = numeric_span_values(html);
    values.sort_unstable_by(|a, b| b.cmp(a));
    values.into_iter().take(top).sum::<u64>() as f64
}

/// Fetches marketplace search pages and extracts supply signals.
pub struct SupplyProbe {
    http: reqwest::Client,
    search_url: String,
    user_agent: String,
    sample_top: usize,
}

impl SupplyProbe {
    pub fn new(
        http: reqwest::Client,
        search_url: String,
        user_agent: String,
        sample_top: usize,
    ) -> Self {
        Self {
            http,
            search_url,
            user_agent,
            sample_top,
        }
    }

    async fn fetch_page(&self, keyword: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[("k", keyword)])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Source(format!("marketplace request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(FetchError::Source(format!(
                "marketplace status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Source(format!("marketplace body unreadable: {}", e)))
    }

    /// Listing count and average review proxy for a keyword.
    pub async fn probe(&self, keyword: &str) -> Result<SupplySnapshot, FetchError> {
        let html = self.fetch_page(keyword).await?;
        let snapshot = extract_supply(&html, self.sample_top);
        debug!(
            "supply for '{}': {} listings, avg reviews {}",
            keyword, snapshot.listing_count, snapshot.avg_review_proxy
        );
        Ok(snapshot)
    }

    /// Monitor-mode review velocity: sum of the largest review counts
    /// visible on the page.
    pub async fn review_velocity(&self, keyword: &str) -> Result<f64, FetchError> {
        let html = self.fetch_page(keyword).await?;
        Ok(extract_velocity(&html, self.sample_top))
    }
}
