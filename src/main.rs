use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use sales_insights::reports::ReportStatus;
use sales_insights::{Pipeline, PipelineConfig, ReportKind, ReportSummary};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load the manufacturing sales extracts and export the sales reports
#[derive(Parser)]
#[command(name = "sales-insights")]
#[command(about = "Manufacturing sales ETL and reporting")]
struct Args {
    /// Pipeline configuration file (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the source extracts are read from
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// SQLite store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory the report files are written to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load, join and generate every report
    Run,
    /// Load the sources and rebuild full_sales_data only
    Load,
    /// Regenerate reports from the stored full_sales_data
    Report {
        /// Reports to generate (default: all)
        #[arg(long, value_enum)]
        only: Vec<ReportKind>,
    },
    /// Print the effective configuration as JSON
    PrintConfig,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn finish(summary: &ReportSummary) -> Result<()> {
    for outcome in &summary.outcomes {
        match &outcome.status {
            ReportStatus::Written { rows } => {
                println!("  {:<24} {:>6} rows  {}", outcome.kind, rows, outcome.path.display())
            }
            ReportStatus::Failed(reason) => {
                println!("  {:<24} FAILED  {}", outcome.kind, reason)
            }
        }
    }
    let failed = summary.failures().count();
    if failed > 0 {
        bail!("{} of {} reports failed", failed, summary.outcomes.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    let pipeline = Pipeline::new(config);

    match &args.command {
        Command::Run => {
            info!("Sales insights run starting...");
            let summary = pipeline.run()?;
            println!(
                "\n=== Loaded {} tables, {} sales rows joined ===",
                summary.load.tables.len(),
                summary.load.full_sales_rows
            );
            finish(&summary.reports)
        }
        Command::Load => {
            let mut store = pipeline.open_store()?;
            let summary = pipeline.load(&mut store)?;
            for table in &summary.tables {
                println!("  {:<24} {:>6} rows  {}", table.table, table.rows, table.path.display());
            }
            println!("  {:<24} {:>6} rows", "full_sales_data", summary.full_sales_rows);
            Ok(())
        }
        Command::Report { only } => {
            let kinds = if only.is_empty() {
                ReportKind::ALL.to_vec()
            } else {
                only.clone()
            };
            let store = pipeline.open_store()?;
            let summary = pipeline.reports(&store, &kinds)?;
            finish(&summary)
        }
        Command::PrintConfig => {
            println!("{}", pipeline.config().to_json()?);
            Ok(())
        }
    }
}
