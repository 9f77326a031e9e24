//! Composite demand scoring.
//!
//! Pure numeric logic: sanitization of non-finite values, trend spike
//! ratios, the weighted demand scores for both pipeline modes, and the
//! supply-adjusted gap index.

/// Coerce non-finite values to 0.0.
///
/// Upstream arithmetic may produce NaN or infinities (a zero baseline,
/// an empty sample); this is the single place they are caught. Pure and
/// idempotent.
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Relative growth of the last `window` points over the first `window`
/// points of an interest-over-time series, floor-clamped at zero.
///
/// Returns 0.0 when the series is empty, shorter than one window, or
/// the baseline window mean is zero. The zero-baseline case is a
/// guarded path, not an error: a keyword with no historical interest
/// has no measurable spike.
pub fn spike_ratio(series: &[f64], window: usize) -> f64 {
    if window == 0 || series.len() < window {
        return 0.0;
    }

    let prior = mean(&series[..window]);
    if prior == 0.0 {
        return 0.0;
    }

    let recent = mean(&series[series.len() - window..]);
    ((recent - prior) / prior).max(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Weights for the two-signal (discover) demand score. Should sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct DemandWeights {
    pub trend: f64,
    pub volume: f64,
}

impl Default for DemandWeights {
    fn default() -> Self {
        Self {
            trend: 0.6,
            volume: 0.4,
        }
    }
}

/// Weights for the three-signal (monitor) demand score. Should sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct MomentumWeights {
    pub trend: f64,
    pub velocity: f64,
    pub social: f64,
}

impl Default for MomentumWeights {
    fn default() -> Self {
        Self {
            trend: 0.4,
            velocity: 0.3,
            social: 0.3,
        }
    }
}

/// Two-signal weighted demand score.
///
/// The spike is floor-clamped only: an extreme spike should not be
/// artificially suppressed. The normalized volume is clamped to [0, 1]
/// before weighting.
pub fn demand_score(spike: f64, norm_volume: f64, weights: DemandWeights) -> f64 {
    weights.trend * sanitize(spike).max(0.0) + weights.volume * sanitize(norm_volume).clamp(0.0, 1.0)
}

/// Three-signal weighted demand score for monitor mode. Both the
/// velocity and social inputs are expected pre-normalized and are
/// clamped to [0, 1].
pub fn momentum_score(
    spike: f64,
    velocity_norm: f64,
    social_norm: f64,
    weights: MomentumWeights,
) -> f64 {
    weights.trend * sanitize(spike).max(0.0)
        + weights.velocity * sanitize(velocity_norm).clamp(0.0, 1.0)
        + weights.social * sanitize(social_norm).clamp(0.0, 1.0)
}

/// Demand score scaled by inverse competitive pressure.
///
/// The `+ 1` keeps the denominator positive when a keyword has no
/// discoverable competing listings, which simultaneously gives
/// low-supply/high-demand keywords the highest index values. The score
/// input is sanitized here as a guard; the result is sanitized once
/// more at record construction like every other float field.
pub fn gap_index(score: f64, listing_count: usize, avg_review_proxy: f64) -> f64 {
    sanitize(score) / (listing_count as f64 * avg_review_proxy + 1.0)
}

/// Points per comparison window of the 12-month interest series.
pub const SPIKE_WINDOW: usize = 12;
