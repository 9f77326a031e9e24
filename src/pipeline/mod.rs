//! Per-keyword pipeline orchestration.
//!
//! Keywords are processed sequentially in discovery order with a fixed
//! inter-keyword delay to stay under external rate limits. The signal
//! probes for a single keyword have no data dependency on one another
//! and run concurrently; record assembly waits for all of them, and
//! every float is sanitized exactly once when the row is built.

use crate::models::{DemandRecord, MomentumRecord, SupplySnapshot};
use crate::probes::volume::normalize_volume;
use crate::probes::{SocialClient, SupplyProbe, VolumeClient};
use crate::scoring::{
    demand_score, gap_index, momentum_score, sanitize, spike_ratio, DemandWeights,
    MomentumWeights, SPIKE_WINDOW,
};
use crate::sink::AlertSender;
use crate::trends::{FetchError, TrendsClient};
use async_trait::async_trait;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The independent per-keyword signal probes, mockable in tests.
#[async_trait]
pub trait SignalProbes: Send + Sync {
    /// Trend spike ratio over the 12-month interest series.
    async fn trend_spike(&self, keyword: &str) -> Result<f64, FetchError>;

    /// Clamped search volume estimate.
    async fn search_volume(&self, keyword: &str) -> Result<u64, FetchError>;

    /// Marketplace listing count and review proxy.
    async fn supply(&self, keyword: &str) -> Result<SupplySnapshot, FetchError>;

    /// Monitor-mode review velocity.
    async fn review_velocity(&self, keyword: &str) -> Result<f64, FetchError>;

    /// Monitor-mode social growth proxy.
    async fn social_growth(&self, keyword: &str) -> Result<f64, FetchError>;
}

/// Production probe set wired to the live external sources.
pub struct LiveProbes {
    trends: Arc<TrendsClient>,
    volume: VolumeClient,
    supply: SupplyProbe,
    social: Option<SocialClient>,
}

impl LiveProbes {
    pub fn new(
        trends: Arc<TrendsClient>,
        volume: VolumeClient,
        supply: SupplyProbe,
        social: Option<SocialClient>,
    ) -> Self {
        Self {
            trends,
            volume,
            supply,
            social,
        }
    }
}

#[async_trait]
impl SignalProbes for LiveProbes {
    async fn trend_spike(&self, keyword: &str) -> Result<f64, FetchError> {
        // The trends client already degrades to an empty series on
        // exhaustion; an empty series yields a zero spike.
        let series = self.trends.fetch_series(keyword).await;
        Ok(spike_ratio(&series, SPIKE_WINDOW))
    }

    async fn search_volume(&self, keyword: &str) -> Result<u64, FetchError> {
        self.volume.search_volume(keyword).await
    }

    async fn supply(&self, keyword: &str) -> Result<SupplySnapshot, FetchError> {
        self.supply.probe(keyword).await
    }

    async fn review_velocity(&self, keyword: &str) -> Result<f64, FetchError> {
        self.supply.review_velocity(keyword).await
    }

    async fn social_growth(&self, keyword: &str) -> Result<f64, FetchError> {
        match &self.social {
            Some(client) => client.growth_proxy(keyword).await,
            None => Err(FetchError::Source("social API key not configured".to_string())),
        }
    }
}

/// Shared pacing/display options for both pipeline modes.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Delay applied after each keyword's full processing.
    pub delay: Duration,
    /// Show a progress bar over keywords.
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            show_progress: true,
        }
    }
}

fn progress_bar(total: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total == 0 {
        return None;
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    Some(pb)
}

/// Degrade a failed signal to its zero default, keeping the failure
/// visible in logs. Emitted records carry the same zero either way.
fn measure<T>(result: Result<T, FetchError>, keyword: &str, signal: &str, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("{} unavailable for '{}', recording default: {}", signal, keyword, e);
            default
        }
    }
}

fn iso_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn plain_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Assemble one discover-mode record. The single sanitization point
/// for its float fields.
#[allow(clippy::too_many_arguments)]
fn build_demand_record(
    timestamp: String,
    keyword: String,
    spike: f64,
    search_volume: u64,
    norm_volume: f64,
    supply: SupplySnapshot,
    score: f64,
    gap: f64,
) -> DemandRecord {
    DemandRecord {
        timestamp,
        keyword,
        trend_spike: sanitize(spike),
        search_volume,
        norm_volume: sanitize(norm_volume),
        listing_count: supply.listing_count,
        avg_review_proxy: sanitize(supply.avg_review_proxy),
        demand_score: sanitize(score),
        gap_index: sanitize(gap),
    }
}

/// Assemble one monitor-mode record; sanitization point as above.
fn build_momentum_record(
    timestamp: String,
    keyword: String,
    spike: f64,
    velocity: f64,
    social: f64,
    score: f64,
) -> MomentumRecord {
    MomentumRecord {
        timestamp,
        keyword,
        trend_spike: sanitize(spike),
        review_velocity: sanitize(velocity),
        social_growth: sanitize(social),
        demand_score: sanitize(score),
    }
}

/// Discover-mode pipeline: trend spike + search volume + marketplace
/// supply per keyword, producing demand score and gap index.
pub struct DiscoverPipeline<P: SignalProbes> {
    probes: P,
    weights: DemandWeights,
    max_vol: u64,
    options: PipelineOptions,
}

impl<P: SignalProbes> DiscoverPipeline<P> {
    pub fn new(probes: P, weights: DemandWeights, max_vol: u64, options: PipelineOptions) -> Self {
        Self {
            probes,
            weights,
            max_vol,
            options,
        }
    }

    /// Score every keyword. Always yields one record per keyword, in
    /// input order; individual signal failures zero out that field.
    pub async fn run(&self, keywords: &[String]) -> Vec<DemandRecord> {
        let pb = progress_bar(keywords.len(), self.options.show_progress);
        let mut records = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            if let Some(ref pb) = pb {
                pb.set_message(keyword.clone());
            }

            let timestamp = iso_timestamp();
            let (spike_res, volume_res, supply_res) = tokio::join!(
                self.probes.trend_spike(keyword),
                self.probes.search_volume(keyword),
                self.probes.supply(keyword),
            );

            let spike = measure(spike_res, keyword, "trend spike", 0.0);
            let volume = measure(volume_res, keyword, "search volume", 0);
            let supply = measure(supply_res, keyword, "marketplace supply", SupplySnapshot::default());

            let norm_volume = normalize_volume(volume, self.max_vol);
            let score = demand_score(spike, norm_volume, self.weights);
            let gap = gap_index(score, supply.listing_count, supply.avg_review_proxy);

            records.push(build_demand_record(
                timestamp,
                keyword.clone(),
                spike,
                volume,
                norm_volume,
                supply,
                score,
                gap,
            ));

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            tokio::time::sleep(self.options.delay).await;
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        info!("Scored {} keywords", records.len());
        records
    }
}

/// Monitor-mode pipeline: trend spike + review velocity + social
/// growth per seed, with threshold alerting.
pub struct MonitorPipeline<P: SignalProbes> {
    probes: P,
    weights: MomentumWeights,
    velocity_norm: f64,
    threshold: f64,
    alerts: Option<AlertSender>,
    options: PipelineOptions,
}

impl<P: SignalProbes> MonitorPipeline<P> {
    pub fn new(
        probes: P,
        weights: MomentumWeights,
        velocity_norm: f64,
        threshold: f64,
        alerts: Option<AlertSender>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            probes,
            weights,
            velocity_norm,
            threshold,
            alerts,
            options,
        }
    }

    /// Score every seed; returns the records plus the number of seeds
    /// at or above the alert threshold. When a sender is configured,
    /// each of those fires a one-shot alert.
    pub async fn run(&self, seeds: &[String]) -> (Vec<MomentumRecord>, usize) {
        let pb = progress_bar(seeds.len(), self.options.show_progress);
        let mut records = Vec::with_capacity(seeds.len());
        let mut above_threshold = 0;
        // One run, one stamp: every row of a monitoring pass carries
        // the same run time.
        let timestamp = plain_timestamp();

        for keyword in seeds {
            if let Some(ref pb) = pb {
                pb.set_message(keyword.clone());
            }

            let (spike_res, velocity_res, social_res) = tokio::join!(
                self.probes.trend_spike(keyword),
                self.probes.review_velocity(keyword),
                self.probes.social_growth(keyword),
            );

            let spike = measure(spike_res, keyword, "trend spike", 0.0);
            let velocity = measure(velocity_res, keyword, "review velocity", 0.0);
            let social = measure(social_res, keyword, "social growth", 0.0);

            let velocity_n = (sanitize(velocity) / self.velocity_norm).min(1.0);
            let social_n = sanitize(social).min(1.0);
            let score = momentum_score(spike, velocity_n, social_n, self.weights);

            if score >= self.threshold {
                above_threshold += 1;
                if let Some(ref sender) = self.alerts {
                    // One-shot, fire-and-forget; the outcome is logged
                    // inside the sender and never affects the record.
                    sender.send(keyword, score).await;
                }
            }

            records.push(build_momentum_record(
                timestamp.clone(),
                keyword.clone(),
                spike,
                velocity,
                social,
                score,
            ));

            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            tokio::time::sleep(self.options.delay).await;
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        info!(
            "Scored {} seeds, {} above alert threshold",
            records.len(),
            above_threshold
        );
        (records, above_threshold)
    }
}
