//! Data models for the demand scanner.
//!
//! This module contains the record types emitted by the pipelines and
//! the intermediate signal snapshots shared between probes and scoring.

use serde::{Deserialize, Serialize};

/// Column header for discover-mode records. Downstream consumers index
/// by position, so the order is part of the output contract.
pub const DEMAND_HEADER: [&str; 9] = [
    "Timestamp",
    "Keyword",
    "TrendSpike",
    "SearchVol",
    "NormVol",
    "Listings",
    "AvgReviews",
    "DemandScore",
    "GapIndex",
];

/// Column header for monitor-mode records.
pub const MOMENTUM_HEADER: [&str; 6] = [
    "Timestamp",
    "Keyword",
    "TrendSpike",
    "Velocity",
    "Social",
    "DemandScore",
];

/// One scored keyword from a discover-mode run.
///
/// Every float field is finite; the pipeline sanitizes values at
/// construction time, never afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRecord {
    /// Run timestamp, ISO-8601 with second precision.
    pub timestamp: String,
    /// The scored keyword (non-empty).
    pub keyword: String,
    /// Relative growth of the recent trend window over the baseline window.
    pub trend_spike: f64,
    /// Estimated monthly search volume, clamped to the configured cap.
    pub search_volume: u64,
    /// `search_volume / max_vol`, in [0, 1].
    pub norm_volume: f64,
    /// Number of competing marketplace listings found.
    pub listing_count: usize,
    /// Mean review count over the sampled top listings.
    pub avg_review_proxy: f64,
    /// Weighted combination of the normalized demand signals.
    pub demand_score: f64,
    /// Demand score scaled by inverse competitive pressure.
    pub gap_index: f64,
}

impl DemandRecord {
    /// Render the record as CSV cells in header-column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.keyword.clone(),
            self.trend_spike.to_string(),
            self.search_volume.to_string(),
            self.norm_volume.to_string(),
            self.listing_count.to_string(),
            self.avg_review_proxy.to_string(),
            self.demand_score.to_string(),
            self.gap_index.to_string(),
        ]
    }
}

/// One scored keyword from a monitor-mode run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumRecord {
    /// Run timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// The monitored keyword.
    pub keyword: String,
    /// Relative growth of the recent trend window over the baseline window.
    pub trend_spike: f64,
    /// Sum of the largest review counts found on the marketplace page.
    pub review_velocity: f64,
    /// Summed video view counts scaled down to a bounded-ish proxy.
    pub social_growth: f64,
    /// Weighted three-signal demand score.
    pub demand_score: f64,
}

impl MomentumRecord {
    /// Render the record as CSV cells in header-column order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.timestamp.clone(),
            self.keyword.clone(),
            self.trend_spike.to_string(),
            self.review_velocity.to_string(),
            self.social_growth.to_string(),
            self.demand_score.to_string(),
        ]
    }
}

/// Competitive-supply measurements from one marketplace results page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SupplySnapshot {
    /// Total listing blocks matched on the page.
    pub listing_count: usize,
    /// Mean of the review counts parsed from the sampled top listings,
    /// or 0.0 when none parsed as numeric.
    pub avg_review_proxy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_row_matches_header() {
        let record = DemandRecord {
            timestamp: "2024-01-01T00:00:00".to_string(),
            keyword: "ergonomic pillow".to_string(),
            trend_spike: 1.5,
            search_volume: 42_000,
            norm_volume: 0.42,
            listing_count: 12,
            avg_review_proxy: 310.5,
            demand_score: 0.9,
            gap_index: 0.1,
        };

        let row = record.to_row();
        assert_eq!(row.len(), DEMAND_HEADER.len());
        assert_eq!(row[0], "2024-01-01T00:00:00");
        assert_eq!(row[1], "ergonomic pillow");
        assert_eq!(row[3], "42000");
        assert_eq!(row[8], "0.1");
    }

    #[test]
    fn test_momentum_row_matches_header() {
        let record = MomentumRecord {
            timestamp: "2024-01-01 00:00:00".to_string(),
            keyword: "desk lamp".to_string(),
            trend_spike: 0.0,
            review_velocity: 1200.0,
            social_growth: 0.7,
            demand_score: 0.35,
        };

        let row = record.to_row();
        assert_eq!(row.len(), MOMENTUM_HEADER.len());
        assert_eq!(row[4], "0.7");
        assert_eq!(row[5], "0.35");
    }
}
