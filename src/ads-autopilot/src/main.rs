//! Ads Autopilot: pulls ads performance data, derives CPL / hook / hold
//! metrics and fatigue flags, and prints a report for people or for the
//! summary writer.

mod report;

use autopilot_cache::ResultCache;
use autopilot_core::config::{check_fatigue_threshold, AppConfig};
use autopilot_core::EntityType;
use autopilot_fetch::{ExportDirProvider, FetchOrchestrator, FetchRequest};
use autopilot_reporting::RankMetric;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use report::{build_report, ReportOptions};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "ads-autopilot")]
#[command(about = "Ads performance metrics, fatigue detection and reporting")]
#[command(version)]
struct Cli {
    /// Optional TOML config file (environment variables still apply on top)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Cache directory (overrides config)
    #[arg(long, global = true, env = "ADS_AUTOPILOT__CACHE__DIR")]
    cache_dir: Option<String>,

    /// Directory holding exported insight rows (overrides config)
    #[arg(long, global = true, env = "ADS_AUTOPILOT__UPSTREAM__EXPORT_DIR")]
    export_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch a date range and print the derived performance report
    Report {
        /// Entity level: campaigns or ads
        #[arg(short, long, default_value = "ads")]
        entity: EntityType,

        /// Days to look back, including today (defaults to config)
        #[arg(short, long)]
        days: Option<u32>,

        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Last day of the range (YYYY-MM-DD, default today)
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Ignore cached results and fetch live
        #[arg(long, default_value_t = false)]
        force_refresh: bool,

        /// Metric used for top / underperformer ranking
        #[arg(long, default_value = "cpl")]
        rank_by: RankMetric,

        /// Number of top / underperformers to list (defaults to config)
        #[arg(long)]
        top: Option<usize>,

        /// Fatigue frequency threshold (overrides config)
        #[arg(long)]
        fatigue_threshold: Option<f64>,

        /// Upstream timeout in milliseconds (overrides config)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print JSON instead of the markdown report
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete every cached result
    ClearCache,
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))?,
        None => AppConfig::load(None).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            AppConfig::default()
        }),
    };

    // Apply CLI overrides
    if let Some(dir) = &cli.cache_dir {
        config.cache.dir = dir.clone();
    }
    if let Some(dir) = &cli.export_dir {
        config.upstream.export_dir = dir.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for the report itself.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ads_autopilot=info,autopilot_fetch=info,autopilot_cache=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    info!(
        cache_dir = %config.cache.dir,
        export_dir = %config.upstream.export_dir,
        account_id = config.upstream.account_id.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    let cache = Arc::new(ResultCache::from_config(&config.cache));

    match cli.command {
        Commands::ClearCache => {
            let removed = cache.clear_all()?;
            println!("Removed {removed} cached result(s).");
        }
        Commands::Report {
            entity,
            days,
            since,
            until,
            force_refresh,
            rank_by,
            top,
            fatigue_threshold,
            timeout_ms,
            json,
        } => {
            let provider = Arc::new(ExportDirProvider::new(&config.upstream.export_dir));
            let orchestrator = FetchOrchestrator::from_config(provider, cache, &config);

            let mut request = FetchRequest::new(entity)
                .last_days(days.unwrap_or(config.fetch.default_days))
                .between(since, until)
                .force_refresh(force_refresh);
            if let Some(ms) = timeout_ms {
                request = request.with_timeout(Duration::from_millis(ms));
            }

            let batch = match orchestrator.fetch(&request).await {
                Ok(batch) => batch,
                Err(e) => {
                    if e.is_fetch_failure() {
                        error!(error = %e, "Fetch failed; retry later or check the export");
                    }
                    return Err(e.into());
                }
            };

            let fatigue_threshold = match fatigue_threshold {
                Some(value) => check_fatigue_threshold(value)?,
                None => config.analysis.fatigue_threshold,
            };
            let options = ReportOptions {
                fatigue_threshold,
                rank_by,
                top_n: top.unwrap_or(config.analysis.top_n),
                currency: config.analysis.currency_symbol.clone(),
            };
            let report = build_report(batch, &options);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render_text());
            }
        }
    }

    Ok(())
}
