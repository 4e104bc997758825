use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};
use tracing::warn;

use runstack::activity::{load_activities, ActivityFilter, ActivityRow};
use runstack::config::AppConfig;
use runstack::export::{self, ExportFormat};
use runstack::import::batch::{BatchAnalyzer, BatchConfig, BatchSummary};
use runstack::import::fit::FitImporter;
use runstack::import::{ImportManager, MetricsReport};
use runstack::logging::{init_logging, LogFormat, LogLevel};

/// RunStack - Workout Performance Metrics CLI
///
/// Derives heart rate drift, pace/HR ratio, cadence consistency and aerobic
/// decoupling from recorded workout time series.
#[derive(Parser)]
#[command(name = "runstack")]
#[command(version)]
#[command(about = "Workout time-series performance metrics", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for one activity file (FIT or CSV)
    Analyze {
        /// Input file path
        #[arg(short, long)]
        file: PathBuf,

        /// Also write the normalized time series to this CSV
        #[arg(long)]
        timeseries_csv: Option<PathBuf>,

        /// Output format (text, json, csv)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute metrics for every activity file in a directory
    Batch {
        /// Directory to scan (non-recursive)
        #[arg(short, long)]
        dir: PathBuf,

        /// Write per-activity metrics to this CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Filter an activity listing and export it to CSV
    Export {
        /// JSON array of provider activity objects
        #[arg(short, long)]
        activities: PathBuf,

        /// Lookback window in days
        #[arg(long)]
        days: Option<i64>,

        /// Maximum activities to take from the listing
        #[arg(long)]
        limit: Option<usize>,

        /// Only keep activities with this type key (e.g. running)
        #[arg(long)]
        activity_type: Option<String>,

        /// Output CSV path
        #[arg(long)]
        csv_path: Option<PathBuf>,

        /// Merge heart rate/cadence summaries from <fit-dir>/<activity_id>.fit
        #[arg(long)]
        include_fit: bool,

        /// Directory holding downloaded FIT files
        #[arg(long)]
        fit_dir: Option<PathBuf>,
    },

    /// Show or initialize the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) if path.exists() => AppConfig::load_from_file(path)?,
        Some(_) => AppConfig::default(),
        None => AppConfig::load_or_default(),
    };

    if let Some(level) = LogLevel::from_verbosity(cli.verbose) {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Analyze {
            file,
            timeseries_csv,
            format,
        } => run_analyze(&config, &file, timeseries_csv, &format),

        Commands::Batch { dir, output, jobs } => run_batch(&config, &dir, output, jobs),

        Commands::Export {
            activities,
            days,
            limit,
            activity_type,
            csv_path,
            include_fit,
            fit_dir,
        } => {
            let settings = &config.export;
            run_export(ExportArgs {
                activities,
                days: days.unwrap_or(settings.days),
                limit: limit.unwrap_or(settings.limit),
                activity_type: activity_type.unwrap_or_else(|| settings.activity_type.clone()),
                csv_path: csv_path.unwrap_or_else(|| settings.csv_path.clone()),
                include_fit: include_fit || settings.include_fit,
                fit_dir: fit_dir.unwrap_or_else(|| settings.fit_dir.clone()),
            })
        }

        Commands::Config { show, init } => run_config(&mut config, cli.config.as_deref(), show, init),
    }
}

fn run_analyze(
    config: &AppConfig,
    file: &Path,
    timeseries_csv: Option<PathBuf>,
    format: &str,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let manager = ImportManager::new();
    let analysis = manager
        .analyze_file(file)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if let Some(path) = timeseries_csv.or_else(|| config.analysis.timeseries_csv.clone()) {
        export::csv::save_timeseries(&analysis.series, &path)
            .with_context(|| format!("Failed to write time series to {}", path.display()))?;
        eprintln!("{} {}", "Saved time series:".dimmed(), path.display());
    }

    let report = MetricsReport::from(&analysis);
    match format {
        ExportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ExportFormat::Csv => export::csv::write_metrics(&[&report], std::io::stdout().lock())?,
        ExportFormat::Text => {
            println!("{} {}", "Activity:".bold(), file.display());
            println!("{} {}", "Samples:".bold(), analysis.series.len());
            println!();
            print!("{}", export::text::render_metrics(&analysis.metrics));
        }
    }

    Ok(())
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Samples")]
    samples: String,
    #[tabled(rename = "Avg HR")]
    avg_hr: String,
    #[tabled(rename = "Max HR")]
    max_hr: String,
    #[tabled(rename = "HR Drift %")]
    hr_drift: String,
    #[tabled(rename = "Pace/HR")]
    pace_hr: String,
    #[tabled(rename = "Cadence %")]
    cadence: String,
    #[tabled(rename = "Decoupling %")]
    decoupling: String,
}

fn batch_rows(summary: &BatchSummary) -> Vec<BatchRow> {
    let cell = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());

    summary
        .results
        .iter()
        .map(|result| {
            let file = result
                .file_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            match &result.report {
                Some(report) => BatchRow {
                    file,
                    samples: report.samples.to_string(),
                    avg_hr: cell(report.metrics.avg_hr),
                    max_hr: cell(report.metrics.max_hr),
                    hr_drift: cell(report.metrics.hr_drift_pct),
                    pace_hr: cell(report.metrics.pace_hr_ratio),
                    cadence: cell(report.metrics.cadence_consistency_pct),
                    decoupling: cell(report.metrics.aerobic_decoupling_pct),
                },
                None => BatchRow {
                    file,
                    samples: "error".to_string(),
                    avg_hr: "-".to_string(),
                    max_hr: "-".to_string(),
                    hr_drift: "-".to_string(),
                    pace_hr: "-".to_string(),
                    cadence: "-".to_string(),
                    decoupling: "-".to_string(),
                },
            }
        })
        .collect()
}

fn run_batch(config: &AppConfig, dir: &Path, output: Option<PathBuf>, jobs: Option<usize>) -> Result<()> {
    println!("{}", "Analyzing activity files...".cyan().bold());

    let analyzer = BatchAnalyzer::with_config(BatchConfig {
        num_threads: jobs.or(config.analysis.batch_threads),
        show_progress: config.analysis.show_progress,
    });
    let summary = analyzer.analyze_directory(dir)?;

    if summary.total_files == 0 {
        println!("{}", format!("No activity files found in {}", dir.display()).yellow());
        return Ok(());
    }

    println!("{}", Table::new(batch_rows(&summary)));

    for (path, error) in summary.errors() {
        println!("{} {}: {}", "✗".red(), path.display(), error);
    }

    if let Some(path) = output {
        export::csv::save_metrics(&summary.reports(), &path)?;
        println!("{} {}", "Saved metrics to".green(), path.display());
    }

    println!(
        "{}",
        format!(
            "✓ {} of {} files analyzed",
            summary.successful_files, summary.total_files
        )
        .cyan()
    );
    Ok(())
}

struct ExportArgs {
    activities: PathBuf,
    days: i64,
    limit: usize,
    activity_type: String,
    csv_path: PathBuf,
    include_fit: bool,
    fit_dir: PathBuf,
}

fn run_export(args: ExportArgs) -> Result<()> {
    println!("{}", "Exporting activities...".green().bold());

    let listing: Vec<_> = load_activities(&args.activities)
        .with_context(|| format!("Failed to load activities from {}", args.activities.display()))?
        .into_iter()
        .take(args.limit)
        .collect();

    let filtered = ActivityFilter::new(args.days, args.activity_type.clone()).apply(listing, Utc::now());

    let mut rows = Vec::with_capacity(filtered.len());
    for activity in &filtered {
        let row = ActivityRow::from_metadata(activity);
        let row = match (&row.activity_id, args.include_fit) {
            (Some(id), true) => {
                let fit_path = args.fit_dir.join(format!("{}.fit", id));
                match FitImporter::summarize(&fit_path) {
                    Ok(summary) => row.with_fit_summary(&summary),
                    Err(e) => {
                        warn!("No FIT data for activity {}: {}", id, e.user_message());
                        row
                    }
                }
            }
            _ => row,
        };
        rows.push(row);
    }

    export::csv::save_activities(&rows, &args.csv_path)?;
    println!(
        "{}",
        format!(
            "✓ Saved {} {} activities from the last {} days to {}",
            rows.len(),
            args.activity_type,
            args.days,
            args.csv_path.display()
        )
        .green()
    );
    Ok(())
}

fn run_config(config: &mut AppConfig, custom_path: Option<&Path>, show: bool, init: bool) -> Result<()> {
    let config_path = custom_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_config_path);

    if init {
        if config_path.exists() {
            println!("Configuration already exists at {}", config_path.display());
        } else {
            match custom_path {
                Some(path) => config.save_to_file(path)?,
                None => config.save_default()?,
            }
            println!("{} {}", "✓ Wrote default configuration to".green(), config_path.display());
        }
    }

    if show || !init {
        println!("{}", format!("# {}", config_path.display()).dimmed());
        println!("{}", toml::to_string_pretty(&*config)?);
    }

    Ok(())
}
