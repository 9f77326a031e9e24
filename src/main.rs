//! DemandScout - Multi-signal Keyword Demand Scanner
//!
//! A CLI tool that discovers candidate product keywords, scores their
//! market demand from trend, volume, supply, and social signals, and
//! writes the results to CSV with optional webhook alerts.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, seed file, sink write failure, etc.)

mod cli;
mod config;
mod discovery;
mod models;
mod pipeline;
mod probes;
mod scoring;
mod sink;
mod trends;

use anyhow::{Context, Result};
use cli::{Args, Mode};
use config::Config;
use discovery::SeedDiscovery;
use models::{DEMAND_HEADER, MOMENTUM_HEADER};
use pipeline::{DiscoverPipeline, LiveProbes, MonitorPipeline, PipelineOptions};
use probes::{SocialClient, SupplyProbe, VolumeClient};
use scoring::{DemandWeights, MomentumWeights};
use sink::AlertSender;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use trends::{HttpTrendSource, RetryPolicy, TrendsClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("DemandScout v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the scan
    match run_scan(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Scan failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .demandscout.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".demandscout.toml");

    if path.exists() {
        eprintln!("⚠️  .demandscout.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .demandscout.toml")?;

    println!("✅ Created .demandscout.toml with default settings.");
    println!("   Edit it to customize endpoints, weights, and pacing.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete scan workflow.
async fn run_scan(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // One shared HTTP client for every external source, scoped to this run.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to create HTTP client")?;

    // The trends client is the single retry authority for its source.
    let policy = RetryPolicy {
        attempts: config.trends.attempts,
        settle: Duration::from_secs(config.trends.settle_seconds),
        backoff_step: Duration::from_secs(config.trends.backoff_seconds),
    };
    let source = HttpTrendSource::new(
        http.clone(),
        config.trends.bridge_url.clone(),
        config.trends.geo.clone(),
        config.trends.timeframe.clone(),
    );
    let trends = Arc::new(TrendsClient::new(
        Arc::new(source),
        policy,
        config.trends.related_limit,
    ));

    // Step 1: Collect the keyword set
    let mut keywords = match args.mode {
        Mode::Discover => {
            println!("🔎 Discovering seed keywords (geo: {})...", config.trends.geo);
            let seed_discovery = SeedDiscovery::new(trends.clone(), config.trends.trending_limit);

            let mut all = Vec::new();
            if let Some(ref path) = args.seeds {
                all.extend(discovery::read_seed_file(path)?);
                info!("Loaded {} seeds from {}", all.len(), path.display());
            }
            all.extend(seed_discovery.collect().await);
            discovery::dedupe(all)
        }
        Mode::Monitor => {
            let Some(ref path) = args.seeds else {
                anyhow::bail!("Monitor mode requires --seeds");
            };
            println!("📋 Reading seed keywords from {}...", path.display());
            discovery::read_seed_file(path)?
        }
    };

    if let Some(max) = args.max_seeds {
        keywords.truncate(max);
    }

    if keywords.is_empty() {
        warn!("No keywords to score");
    }

    // Handle --dry-run: print keywords and exit
    if args.dry_run {
        return handle_dry_run(&keywords);
    }

    // Step 2: Wire the signal probes
    let volume = VolumeClient::new(
        http.clone(),
        config.volume.endpoint.clone(),
        config.volume.api_key.clone(),
        config.volume.max_vol,
    );
    let supply = SupplyProbe::new(
        http.clone(),
        config.marketplace.search_url.clone(),
        config.marketplace.user_agent.clone(),
        config.marketplace.sample_top,
    );
    let social = if config.social.api_key.is_empty() {
        None
    } else {
        Some(SocialClient::new(
            http.clone(),
            config.social.endpoint.clone(),
            config.social.api_key.clone(),
            config.social.top_results,
            config.social.view_scale,
        ))
    };
    let probes = LiveProbes::new(trends.clone(), volume, supply, social);

    let options = PipelineOptions {
        delay: Duration::from_secs(config.general.delay_seconds),
        show_progress: !args.quiet,
    };

    // Step 3: Run the pipeline and write the sink
    println!("\n📡 Probing demand signals for {} keywords...", keywords.len());

    match args.mode {
        Mode::Discover => {
            let weights = DemandWeights {
                trend: config.scoring.trend_weight,
                volume: config.scoring.volume_weight,
            };
            let demand_pipeline =
                DiscoverPipeline::new(probes, weights, config.volume.max_vol, options);
            let records = demand_pipeline.run(&keywords).await;

            println!("\n📝 Writing results...");
            let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row()).collect();
            sink::write_csv(Path::new(&config.general.output), &DEMAND_HEADER, &rows)?;

            let duration = start_time.elapsed().as_secs_f64();
            println!("\n📊 Scan Summary:");
            println!("   Keywords scored: {}", records.len());
            if let Some(top) = records.iter().max_by(|a, b| {
                a.gap_index
                    .partial_cmp(&b.gap_index)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }) {
                println!(
                    "   Top gap keyword: {} (gap index {:.4})",
                    top.keyword, top.gap_index
                );
            }
            println!("   Duration: {:.1}s", duration);
        }
        Mode::Monitor => {
            let weights = MomentumWeights {
                trend: config.scoring.momentum_trend_weight,
                velocity: config.scoring.momentum_velocity_weight,
                social: config.scoring.momentum_social_weight,
            };
            let alerts = config
                .alert
                .webhook_url
                .clone()
                .map(|url| AlertSender::new(http.clone(), url));
            if alerts.is_none() {
                info!("No webhook URL configured; alerts disabled");
            }

            let momentum_pipeline = MonitorPipeline::new(
                probes,
                weights,
                config.scoring.velocity_norm,
                config.scoring.alert_threshold,
                alerts,
                options,
            );
            let (records, above_threshold) = momentum_pipeline.run(&keywords).await;

            println!("\n📝 Writing results...");
            let rows: Vec<Vec<String>> = records.iter().map(|r| r.to_row()).collect();
            sink::write_csv(Path::new(&config.general.output), &MOMENTUM_HEADER, &rows)?;

            let duration = start_time.elapsed().as_secs_f64();
            println!("\n📊 Scan Summary:");
            println!("   Keywords scored: {}", records.len());
            println!(
                "   Above threshold: {} (alert threshold {})",
                above_threshold, config.scoring.alert_threshold
            );
            println!("   Duration: {:.1}s", duration);
        }
    }

    println!(
        "\n✅ Scan complete! Results saved to: {}",
        config.general.output
    );

    Ok(())
}

/// Handle --dry-run: print the keyword set without probing anything.
fn handle_dry_run(keywords: &[String]) -> Result<()> {
    println!("\n🔍 Dry run: keyword set (no signal probes)...\n");

    if keywords.is_empty() {
        println!("   No keywords discovered.");
    } else {
        for keyword in keywords {
            println!("     🔑 {}", keyword);
        }
        println!("\n   Total: {} keywords", keywords.len());
    }

    println!("\n✅ Dry run complete. No signal probes were called.");
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .demandscout.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
