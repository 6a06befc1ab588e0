//! @ai:module:intent CLI for the baseline vs tunneled performance analyzer
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use std::path::PathBuf;
use wg_perf::{
    analysis::{
        AggregateResult, BenchmarkProfile, ComparisonAggregator, ComparisonAggregatorTrait,
        MetricCategory, Rating,
    },
    config::{AnalyzerConfig, DEFAULT_CONFIG_FILE},
    records::{
        CollectorLoader, Condition, FileRecordStore, IngestReport, MemoryRecordStore, Metric,
        RecordStore,
    },
    report::{format, ReportGenerator},
};

#[derive(Parser)]
#[command(name = "wg-perf")]
#[command(about = "Compare baseline and tunneled network performance and report the overhead")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze collector results and write reports
    Analyze {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Collector results directory (contains baseline/ and vpn/)
        #[arg(short, long)]
        results_dir: Option<PathBuf>,

        /// Analyze a persisted record store instead of collector files
        #[arg(long, conflicts_with = "results_dir")]
        store: Option<PathBuf>,

        /// Benchmark profile: local or geographic
        #[arg(short, long)]
        profile: Option<String>,

        /// Collector file suffix: "latest" or a run timestamp
        #[arg(short, long)]
        test_type: Option<String>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip PNG chart generation
        #[arg(long)]
        no_charts: bool,
    },

    /// Import collector results into the persistent record store
    Ingest {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Collector results directory (contains baseline/ and vpn/)
        #[arg(short, long)]
        results_dir: Option<PathBuf>,

        /// Record store directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Collector file suffix: "latest" or a run timestamp
        #[arg(short, long)]
        test_type: Option<String>,
    },

    /// Show recorded history for one target and metric
    History {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Record store directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// baseline or tunneled (vpn)
        condition: String,

        /// Target identifier, e.g. gateway
        target: String,

        /// Metric key, e.g. avg_ping_ms
        metric: String,
    },

    /// Print the rating thresholds of a profile
    Thresholds {
        /// Benchmark profile: local or geographic
        #[arg(short, long, default_value = "local")]
        profile: String,
    },

    /// Initialize configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wg_perf=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            results_dir,
            store,
            profile,
            test_type,
            output,
            no_charts,
        } => analyze(AnalyzeArgs {
            config,
            results_dir,
            store,
            profile,
            test_type,
            output,
            no_charts,
        }),
        Commands::Ingest {
            config,
            results_dir,
            store,
            test_type,
        } => ingest(config, results_dir, store, test_type),
        Commands::History {
            config,
            store,
            condition,
            target,
            metric,
        } => history(config, store, &condition, &target, &metric),
        Commands::Thresholds { profile } => thresholds(&profile),
        Commands::Init { output } => init_config(output),
    }
}

struct AnalyzeArgs {
    config: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    store: Option<PathBuf>,
    profile: Option<String>,
    test_type: Option<String>,
    output: Option<PathBuf>,
    no_charts: bool,
}

/// @ai:intent Load results, aggregate, write reports, print the summary
/// @ai:post Err when any collector file was malformed or a comparison failed, after reports are written
/// @ai:effects fs:read, fs:write
fn analyze(args: AnalyzeArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;

    if let Some(profile) = args.profile {
        config.analysis.profile = profile.parse()?;
    }
    if let Some(dir) = args.results_dir {
        config.paths.results_dir = dir;
    }
    if let Some(test_type) = args.test_type {
        config.analysis.test_type = test_type;
    }
    if let Some(dir) = args.output {
        config.paths.analysis_dir = dir;
    }
    if args.no_charts {
        config.analysis.charts = false;
    }

    let aggregator = ComparisonAggregator::new(config.analysis.profile);
    tracing::info!("Analyzing with profile: {}", config.analysis.profile.description());

    let (results, ingest_report) = match args.store {
        Some(store_dir) => {
            tracing::info!("Reading record store {}", store_dir.display());
            let store = FileRecordStore::open(&store_dir)
                .with_context(|| format!("Failed to open record store {}", store_dir.display()))?;
            let results = aggregator.aggregate(&store, &config.analysis.targets, &Metric::ALL);
            (results, None)
        }
        None => {
            let results_dir = &config.paths.results_dir;
            tracing::info!("Loading collector results from {}", results_dir.display());

            let mut store = MemoryRecordStore::new();
            let report = CollectorLoader::new(config.analysis.test_type.as_str())
                .load_into(results_dir, &mut store)
                .with_context(|| format!("Failed to load results from {}", results_dir.display()))?;

            if store.is_empty() {
                tracing::warn!(
                    "No {} test results found in {}",
                    config.analysis.test_type,
                    results_dir.display()
                );
            }

            let results = aggregator.aggregate(&store, &config.analysis.targets, &Metric::ALL);
            (results, Some(report))
        }
    };

    let reporter = ReportGenerator::with_charts(config.analysis.charts);
    let written = reporter.generate_all(&results, &config.paths.analysis_dir)?;

    print_summary(&results);

    println!("Reports:");
    for path in &written {
        println!("  {}", path.display());
    }
    println!();

    if let Some(report) = &ingest_report {
        fail_on_malformed(report)?;
    }

    if !results.issues.is_empty() {
        anyhow::bail!("{} comparison(s) failed on unreadable records", results.issues.len());
    }

    Ok(())
}

/// @ai:intent Import collector results into the file-backed store
/// @ai:effects fs:read, fs:write
fn ingest(
    config_path: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    test_type: Option<String>,
) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let results_dir = results_dir.unwrap_or(config.paths.results_dir);
    let store_dir = store_dir.unwrap_or(config.paths.store_dir);
    let test_type = test_type.unwrap_or(config.analysis.test_type);

    let mut store = FileRecordStore::open(&store_dir)
        .with_context(|| format!("Failed to open record store {}", store_dir.display()))?;

    let report = CollectorLoader::new(test_type)
        .load_into(&results_dir, &mut store)
        .with_context(|| format!("Failed to ingest results from {}", results_dir.display()))?;

    println!(
        "Ingested {} new records ({} already stored; {} baseline, {} tunneled tests) into {}",
        report.records - report.unchanged,
        report.unchanged,
        report.tests(Condition::Baseline),
        report.tests(Condition::Tunneled),
        store_dir.display()
    );

    fail_on_malformed(&report)
}

/// @ai:intent Print the stored history of one (condition, target, metric)
/// @ai:effects fs:read
fn history(
    config_path: Option<PathBuf>,
    store_dir: Option<PathBuf>,
    condition: &str,
    target: &str,
    metric: &str,
) -> Result<()> {
    let config = load_or_default_config(config_path)?;
    let store_dir = store_dir.unwrap_or(config.paths.store_dir);

    let condition = Condition::parse(condition)
        .with_context(|| format!("Unknown condition '{}', expected baseline or tunneled", condition))?;
    let metric = Metric::from_key(metric).with_context(|| {
        let keys: Vec<_> = Metric::ALL.iter().map(|m| m.key()).collect();
        format!("Unknown metric '{}', expected one of: {}", metric, keys.join(", "))
    })?;

    let store = FileRecordStore::open(&store_dir)
        .with_context(|| format!("Failed to open record store {}", store_dir.display()))?;
    let records = store.history(condition, target, metric)?;

    if records.is_empty() {
        println!("No {} records for {}/{}", condition, target, metric);
        return Ok(());
    }

    println!();
    println!("{} {} ({})", format::title(target), metric.label(), condition);
    println!("{}", "-".repeat(50));
    for record in &records {
        println!(
            "{:<25} {:>14} {}",
            record.captured_at.format("%Y-%m-%d %H:%M:%S"),
            format::metric_value(metric, record.value),
            record.interface_label.as_deref().unwrap_or("")
        );
    }
    println!();

    Ok(())
}

/// @ai:intent Print a profile's threshold tables
/// @ai:effects pure
fn thresholds(profile: &str) -> Result<()> {
    let profile: BenchmarkProfile = profile.parse()?;

    println!();
    println!("Thresholds: {}", profile.description());
    println!("{}", "=".repeat(50));

    for category in MetricCategory::ALL {
        println!();
        println!("{}", category.label());
        for (rating, band) in profile.table(category).describe() {
            println!("  {:<12} {}", colorize(rating), band);
        }
    }
    println!();

    Ok(())
}

/// @ai:intent Initialize configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = AnalyzerConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<AnalyzerConfig> {
    match path {
        Some(p) => AnalyzerConfig::load(&p),
        None => AnalyzerConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE)),
    }
}

fn fail_on_malformed(report: &IngestReport) -> Result<()> {
    if !report.has_malformed() {
        return Ok(());
    }

    eprintln!("{}", "Malformed collector files:".red().bold());
    for rejected in &report.rejected {
        eprintln!("  {}: {}", rejected.path.display(), rejected.reason);
    }

    anyhow::bail!("{} collector file(s) could not be parsed", report.rejected.len())
}

fn colorize(rating: Rating) -> ColoredString {
    match rating {
        Rating::Excellent => rating.as_str().green().bold(),
        Rating::Good => rating.as_str().cyan().bold(),
        Rating::Acceptable => rating.as_str().yellow().bold(),
        Rating::Poor => rating.as_str().red().bold(),
        Rating::Unrated => rating.as_str().dimmed(),
    }
}

fn print_summary(results: &AggregateResult) {
    println!();
    println!("Tunnel Performance Summary");
    println!("==========================");
    println!();
    println!("Profile: {}", results.profile.description());
    println!(
        "Tests:   {} baseline, {} tunneled",
        results.baseline_tests, results.vpn_tests
    );
    println!();

    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>10}  {}",
        "Target", "Baseline", "Tunneled", "Overhead", "Percent", "Rating"
    );
    println!("{}", "-".repeat(82));

    for target in &results.targets {
        let Some(avg) = results.find(target, Metric::AvgLatencyMs) else {
            continue;
        };

        println!(
            "{:<20} {:>12} {:>12} {:>12} {:>10}  {}",
            format::title(target),
            format::value(avg.baseline_value, "ms"),
            format::value(avg.tunneled_value, "ms"),
            format::signed(avg.absolute_delta, "ms"),
            format::signed(avg.percent_delta, "%"),
            colorize(avg.rating)
        );
    }
    println!();

    if !results.bandwidth.is_empty() {
        println!(
            "{:<20} {:>12} {:>12} {:>12}  {}",
            "Bandwidth", "Baseline", "Tunneled", "Efficiency", "Rating"
        );
        println!("{}", "-".repeat(72));
        for c in &results.bandwidth {
            println!(
                "{:<20} {:>12} {:>12} {:>12}  {}",
                format::title(&c.target),
                format::metric_value(c.metric, c.baseline_value),
                format::metric_value(c.metric, c.tunneled_value),
                format::value(c.efficiency, "%"),
                colorize(c.rating)
            );
        }
        println!();
    }

    if let Some(dns) = &results.dns {
        println!(
            "DNS resolution ({}): {}",
            dns.domain,
            format::value(dns.resolution_time_seconds.map(|s| s * 1000.0), "ms")
        );
        println!();
    }

    println!("Overall: {}", colorize(results.assessment.rating));

    for issue in &results.issues {
        println!(
            "  {} {}/{}: {}",
            "!".red().bold(),
            issue.target,
            issue.metric.key(),
            issue.message
        );
    }
    println!();
}
