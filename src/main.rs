use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod alerts;
mod config;
mod db;
mod error;
mod models;
mod report;

use models::InternStatus;

#[derive(Parser)]
#[command(name = "deadline-alerts")]
#[command(about = "Training deadline alerts for the internship program", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo roster with deadlines around today
    Seed,
    /// Import interns from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List open deadline alerts
    Alerts {
        #[arg(long)]
        department: Option<String>,
        /// Evaluate as of this date (YYYY-MM-DD) instead of today
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Show alerts that were already marked handled
        #[arg(long)]
        include_dismissed: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Mark an alert as handled
    Dismiss {
        #[arg(long)]
        alert_id: String,
    },
    /// Mark alerts as read without hiding them
    #[command(group(
        ArgGroup::new("target")
            .args(["alert_id", "all"])
            .required(true)
            .multiple(false)
    ))]
    MarkRead {
        #[arg(long)]
        alert_id: Option<String>,
        /// Mark every currently open alert as read
        #[arg(long)]
        all: bool,
    },
    /// Bring back a previously handled alert
    Restore {
        #[arg(long)]
        alert_id: String,
    },
    /// Change an intern's status
    SetStatus {
        #[arg(long)]
        intern_id: String,
        #[arg(long, value_parser = parse_status)]
        status: InternStatus,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_status(value: &str) -> Result<InternStatus, String> {
    value.parse().map_err(|err: error::AlertError| err.to_string())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DEADLINE_ALERTS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = config::Settings::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool, Local::now().date_naive()).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_csv(&pool, &csv).await?;
            println!("Imported {imported} interns from {}.", csv.display());
        }
        Commands::Alerts {
            department,
            as_of,
            include_dismissed,
            format,
        } => {
            let roster = db::fetch_roster(&pool, department.as_deref()).await?;
            let mut open = match as_of {
                Some(date) => alerts::compute_alerts_on(&roster, date)?,
                None => alerts::compute_alerts(&roster, &Local::now())?,
            };
            if !include_dismissed {
                let dismissed = db::fetch_dismissed(&pool).await?;
                open = alerts::without_dismissed(open, &dismissed);
            }

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&open)?);
                }
                OutputFormat::Text => {
                    if open.is_empty() {
                        println!("No training deadlines need attention.");
                        return Ok(());
                    }

                    let read = db::fetch_read(&pool).await?;
                    let summary = alerts::summarize(&open, &read);
                    println!(
                        "{} alerts ({} overdue, {} ending soon, {} high priority, {} unread):",
                        summary.total,
                        summary.overdue,
                        summary.ending_soon,
                        summary.high_priority,
                        summary.unread
                    );
                    for alert in &open {
                        let marker = if read.contains(&alert.id) { " " } else { "*" };
                        println!(
                            "{marker} [{}] {}: {} ({})",
                            alert.priority,
                            alert.title(),
                            alert.message(),
                            alert.id
                        );
                    }
                }
            }
        }
        Commands::Dismiss { alert_id } => {
            if db::dismiss_alert(&pool, &alert_id).await? {
                println!("Alert {alert_id} marked handled.");
            } else {
                println!("Alert {alert_id} was already handled.");
            }
        }
        Commands::MarkRead { alert_id, all } => {
            let ids = match alert_id {
                Some(id) => vec![id],
                None if all => {
                    let roster = db::fetch_roster(&pool, None).await?;
                    let dismissed = db::fetch_dismissed(&pool).await?;
                    let open = alerts::compute_alerts(&roster, &Local::now())?;
                    alerts::without_dismissed(open, &dismissed)
                        .into_iter()
                        .map(|alert| alert.id)
                        .collect()
                }
                None => Vec::new(),
            };
            let marked = db::mark_read(&pool, &ids).await?;
            println!("Marked {marked} alerts as read.");
        }
        Commands::Restore { alert_id } => {
            if db::restore_alert(&pool, &alert_id).await? {
                println!("Alert {alert_id} restored.");
            } else {
                println!("Alert {alert_id} was not marked handled.");
            }
        }
        Commands::SetStatus { intern_id, status } => {
            db::set_status(&pool, &intern_id, status).await?;
            println!("Intern {intern_id} is now {status}.");
        }
        Commands::Report {
            department,
            as_of,
            out,
        } => {
            let today = as_of.unwrap_or_else(|| Local::now().date_naive());
            let roster = db::fetch_roster(&pool, department.as_deref()).await?;
            let dismissed = db::fetch_dismissed(&pool).await?;
            let computed = alerts::compute_alerts_on(&roster, today)?;
            let open = alerts::without_dismissed(computed, &dismissed);
            let read = db::fetch_read(&pool).await?;
            let summary = alerts::summarize(&open, &read);

            let report = report::build_report(department.as_deref(), today, &open, &summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
