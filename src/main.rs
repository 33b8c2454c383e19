use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use team_absence_insights::models::AbsenceRecord;
use team_absence_insights::normalize::{normalize_rows, LeaveRow};
use team_absence_insights::{calendar, db, report, AnalyzerConfig, TeamInsights};

#[derive(Parser)]
#[command(name = "team-absence-insights")]
#[command(about = "Leave pattern, no-show risk and trend alerts for a manager's team", long_about = None)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Manager email; analyzes their direct reports from the database
    #[arg(long)]
    manager: Option<String>,
    /// Leave export to analyze instead of the database
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Number of direct reports (required with --csv)
    #[arg(long, requires = "csv", conflicts_with = "manager")]
    team_size: Option<usize>,
    #[arg(long, default_value_t = 6)]
    since_months: u32,
    /// Analysis date, YYYY-MM-DD (defaults to today, UTC)
    #[arg(long)]
    today: Option<NaiveDate>,
    /// JSON file overriding analyzer thresholds
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a sample manager with four direct reports
    Seed,
    /// Import leave requests from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
        /// Manager the imported employees report to
        #[arg(long)]
        manager: String,
    },
    /// Analyze a team and print the findings
    #[command(group(
        ArgGroup::new("source")
            .args(["manager", "csv"])
            .required(true)
            .multiple(false)
    ))]
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
        /// Print the full result set as JSON
        #[arg(long)]
        json: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("source")
            .args(["manager", "csv"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "absence-report.md")]
        out: PathBuf,
    },
}

struct Team {
    label: String,
    records: Vec<AbsenceRecord>,
    size: usize,
    since: NaiveDate,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must point at the team absence Postgres database")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    match path {
        Some(path) => AnalyzerConfig::from_path(path),
        None => Ok(AnalyzerConfig::default()),
    }
}

fn read_csv_records(path: &Path) -> anyhow::Result<Vec<AbsenceRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let rows = reader
        .deserialize::<LeaveRow>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to read leave rows from {}", path.display()))?;

    let normalized = normalize_rows(&rows);
    if normalized.skipped > 0 {
        tracing::warn!(
            skipped = normalized.skipped,
            kept = normalized.records.len(),
            "some leave rows could not be parsed"
        );
    }
    Ok(normalized.records)
}

async fn load_team(source: &SourceArgs, today: NaiveDate) -> anyhow::Result<Team> {
    let since = calendar::months_back(today, source.since_months);

    if let Some(path) = &source.csv {
        let size = source
            .team_size
            .context("--team-size is required when analyzing a CSV export")?;
        let records: Vec<AbsenceRecord> = read_csv_records(path)?
            .into_iter()
            .filter(|record| record.start_date >= since)
            .collect();
        return Ok(Team {
            label: path.display().to_string(),
            records,
            size,
            since,
        });
    }

    let manager = source
        .manager
        .as_deref()
        .context("either --manager or --csv must be given")?;
    ensure!(
        source.team_size.is_none(),
        "--team-size only applies to --csv; with --manager the team size comes from the database"
    );
    let pool = connect().await?;
    let records = db::fetch_team_records(&pool, manager, since).await?;
    let size = db::count_direct_reports(&pool, manager).await?;
    tracing::debug!(manager, records = records.len(), size, "loaded team from database");

    Ok(Team {
        label: manager.to_string(),
        records,
        size,
        since,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            let inserted = db::seed(&pool, Utc::now().date_naive()).await?;
            println!("Seed data inserted ({inserted} leave requests).");
        }
        Commands::Import { csv, manager } => {
            let pool = connect().await?;
            let summary = db::import_csv(&pool, &csv, &manager).await?;
            println!(
                "Inserted {} leave requests from {} ({} already present, {} skipped).",
                summary.inserted,
                csv.display(),
                summary.duplicates,
                summary.skipped
            );
        }
        Commands::Analyze {
            source,
            json,
            limit,
        } => {
            let today = source.today.unwrap_or_else(|| Utc::now().date_naive());
            let config = load_config(source.config.as_deref())?;
            let team = load_team(&source, today).await?;
            let insights = TeamInsights::compute(&team.records, team.size, today, &config);

            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
                return Ok(());
            }

            if insights.is_empty() {
                println!(
                    "No absence patterns, risks or alerts for {} since {}.",
                    team.label, team.since
                );
                return Ok(());
            }

            println!(
                "Findings for {} ({} absences since {}):",
                team.label, insights.record_count, team.since
            );
            for line in report::summary_lines(&insights, limit) {
                println!("- {line}");
            }
        }
        Commands::Report { source, out } => {
            let today = source.today.unwrap_or_else(|| Utc::now().date_naive());
            let config = load_config(source.config.as_deref())?;
            let team = load_team(&source, today).await?;
            let insights = TeamInsights::compute(&team.records, team.size, today, &config);
            let report = report::build_report(&team.label, team.since, &insights);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
