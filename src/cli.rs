//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// DemandScout - multi-signal keyword demand scanner
///
/// Discovers candidate product keywords, scores their market demand
/// from trend, volume, supply, and social signals, and writes the
/// results to CSV with optional webhook alerts.
///
/// Examples:
///   demandscout
///   demandscout --mode discover --geo IN --output demand_metrics.csv
///   demandscout --mode monitor --seeds seeds.csv --threshold 0.8
///   demandscout --mode discover --dry-run
///   demandscout --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Pipeline mode
    ///
    /// discover: self-discover trending seeds and score demand vs supply.
    /// monitor: score a fixed seed list and fire threshold alerts.
    #[arg(long, value_enum, default_value_t = Mode::Discover)]
    pub mode: Mode,

    /// Seed keyword CSV file (requires a `keyword` column)
    ///
    /// Required in monitor mode. In discover mode the file seeds are
    /// merged ahead of the discovered ones.
    #[arg(short, long, value_name = "FILE")]
    pub seeds: Option<PathBuf>,

    /// Output CSV file path
    #[arg(short, long, default_value = "demand_metrics.csv", value_name = "FILE")]
    pub output: PathBuf,

    /// Path to configuration file
    ///
    /// If not specified, looks for .demandscout.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Region code for trend queries (e.g. IN, US)
    #[arg(long, value_name = "CODE")]
    pub geo: Option<String>,

    /// Cap on the number of keywords scored in one run
    #[arg(long, value_name = "COUNT")]
    pub max_seeds: Option<usize>,

    /// Demand score threshold for webhook alerts (0.0 - 1.0)
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Webhook URL for high-momentum alerts
    #[arg(long, value_name = "URL", env = "DEMANDSCOUT_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// API key for the search volume endpoint
    #[arg(long, value_name = "KEY", env = "DEMANDSCOUT_VOLUME_API_KEY")]
    pub volume_api_key: Option<String>,

    /// API key for the video platform endpoint (enables the social probe)
    #[arg(long, value_name = "KEY", env = "DEMANDSCOUT_SOCIAL_API_KEY")]
    pub social_api_key: Option<String>,

    /// Delay between keywords in seconds (rate-limit pacing)
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: discover and print keywords without probing any signals
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .demandscout.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Pipeline mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Mode {
    /// Self-discovering two-signal pipeline (default)
    #[default]
    Discover,
    /// Fixed-seed three-signal pipeline with alerting
    Monitor,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.mode == Mode::Monitor && self.seeds.is_none() {
            return Err("Monitor mode requires --seeds".to_string());
        }

        if let Some(ref seeds) = self.seeds {
            if !seeds.exists() {
                return Err(format!("Seed file does not exist: {}", seeds.display()));
            }
        }

        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err("Threshold must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(max_seeds) = self.max_seeds {
            if max_seeds == 0 {
                return Err("Max seeds must be at least 1".to_string());
            }
        }

        if let Some(ref url) = self.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Webhook URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            mode: Mode::Discover,
            seeds: None,
            output: PathBuf::from("demand_metrics.csv"),
            config: None,
            geo: None,
            max_seeds: None,
            threshold: None,
            webhook_url: None,
            volume_api_key: None,
            social_api_key: None,
            delay: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_discover_needs_no_seed_file() {
        let args = make_args();
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_monitor_requires_seeds() {
        let mut args = make_args();
        args.mode = Mode::Monitor;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut args = make_args();
        args.threshold = Some(1.5);
        assert!(args.validate().is_err());

        args.threshold = Some(0.8);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_webhook_url_scheme() {
        let mut args = make_args();
        args.webhook_url = Some("ftp://hooks.example.com".to_string());
        assert!(args.validate().is_err());

        args.webhook_url = Some("https://hooks.example.com/demand".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
