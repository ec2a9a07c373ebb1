use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod analytics;
mod chart;
mod db;
mod error;
mod forecast;
mod models;
mod query;
mod report;
mod stats;

use models::{Severity, Status};
use query::{AlertFilter, Pagination};

#[derive(Parser)]
#[command(name = "cloud-alert-dashboard")]
#[command(about = "Cloud security alert monitoring and analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import alerts from a JSONL or CSV file
    #[command(group(
        ArgGroup::new("input")
            .args(["jsonl", "csv"])
            .required(true)
            .multiple(false)
    ))]
    Import {
        #[arg(long)]
        jsonl: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List alerts, newest first, with optional filters
    List {
        #[arg(long)]
        severity: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Print a single alert as JSON
    Get { id: String },
    /// Print severity/status/source/day breakdowns as JSON
    Stats,
    /// Print the full analytics dashboard payload as JSON
    Analytics,
    /// Print trend analysis and next-week volume prediction as JSON
    Forecast,
    /// Generate a markdown dashboard report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { jsonl, csv } => {
            let (inserted, skipped, path) = if let Some(path) = jsonl {
                let (inserted, skipped) = db::import_jsonl(&pool, &path).await?;
                (inserted, skipped, path)
            } else {
                let path = csv.context("either --jsonl or --csv is required")?;
                let (inserted, skipped) = db::import_csv(&pool, &path).await?;
                (inserted, skipped, path)
            };
            println!(
                "Inserted {inserted} alerts from {} ({skipped} skipped).",
                path.display()
            );
        }
        Commands::List {
            severity,
            status,
            source,
            search,
            limit,
            offset,
        } => {
            let severity = severity
                .map(|raw| raw.parse::<Severity>().map_err(anyhow::Error::msg))
                .transpose()
                .context("invalid --severity")?;
            let status = status
                .map(|raw| raw.parse::<Status>().map_err(anyhow::Error::msg))
                .transpose()
                .context("invalid --status")?;
            let filter = AlertFilter {
                severity,
                status,
                source,
                search,
            };
            let page = Pagination { limit, offset };

            let alerts = db::fetch_alerts(&pool).await?;
            let result = query::query(&alerts, &filter, &page);

            println!(
                "Showing {} of {} matching alerts (offset {}).",
                result.items.len(),
                result.total,
                result.offset
            );
            for alert in &result.items {
                println!(
                    "- {} [{}/{}] {}: {}",
                    alert.key(),
                    alert.effective_severity().as_str(),
                    alert.effective_status().as_str(),
                    alert.raw_timestamp().unwrap_or("not available"),
                    alert.message.as_deref().unwrap_or("(no message)")
                );
            }
        }
        Commands::Get { id } => {
            let alert = db::fetch_alert(&pool, &id).await?;
            println!("{}", serde_json::to_string_pretty(&alert)?);
        }
        Commands::Stats => {
            let alerts = db::fetch_alerts(&pool).await?;
            let summary = stats::compute_stats(&alerts);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Analytics => {
            let alerts = db::fetch_alerts(&pool).await?;
            let summary = analytics::compute_advanced(&alerts);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Forecast => {
            let alerts = db::fetch_alerts(&pool).await?;
            let summary = forecast::forecast(forecast::daily_metrics(&alerts));
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Report { out } => {
            let alerts = db::fetch_alerts(&pool).await?;
            let stats_summary = stats::compute_stats(&alerts);
            let advanced = analytics::compute_advanced(&alerts);
            let predictive = forecast::forecast(forecast::daily_metrics(&alerts));
            let report = report::build_report(&stats_summary, &advanced, &predictive);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
