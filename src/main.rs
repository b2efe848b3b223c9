use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod aggregate;
mod dashboard;
mod dataset;
mod error;
mod models;

use error::DashboardError;

#[derive(Parser)]
#[command(name = "churn-dashboard")]
#[command(about = "Churn metrics and chart series from a customer CSV", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print summary metrics and the ranked payment-method table
    Summary {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the dashboard payload as JSON
    Export {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "dashboard.json")]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        match err.downcast_ref::<DashboardError>() {
            Some(DashboardError::Schema { missing }) => {
                eprintln!(
                    "Upload rejected: missing required columns: {}.",
                    missing.join(", ")
                );
                eprintln!("Add the missing columns to the CSV header and upload the file again.");
            }
            _ => {
                eprintln!("Error processing CSV: {err:#}");
                eprintln!(
                    "Ensure the file is a valid CSV with the required columns, \
                     or contact support."
                );
            }
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Summary { csv } => {
            let board = build_dashboard(&csv)?;

            for metric in board.metrics.iter() {
                println!("{}: {}", metric.name, metric.display);
            }

            if board.top_payment_methods.is_empty() {
                println!("No payment methods present in this upload.");
                return Ok(());
            }

            println!("Top payment methods by churn rate:");
            for entry in board.top_payment_methods.iter() {
                println!(
                    "- {}: {} ({} churned of {} customers)",
                    entry.label,
                    dashboard::format_percent(entry.rate),
                    entry.churned,
                    entry.row_count
                );
            }
        }
        Commands::Report { csv, out } => {
            let board = build_dashboard(&csv)?;
            let report = dashboard::build_report(&board);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { csv, out } => {
            let board = build_dashboard(&csv)?;
            let payload = serde_json::to_string_pretty(&board)?;
            std::fs::write(&out, payload)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Dashboard payload written to {}.", out.display());
        }
    }

    Ok(())
}

fn build_dashboard(csv: &Path) -> anyhow::Result<dashboard::Dashboard> {
    let file =
        std::fs::File::open(csv).with_context(|| format!("failed to open {}", csv.display()))?;
    let records = dataset::load_table(file)?;
    Ok(dashboard::assemble(&records))
}
