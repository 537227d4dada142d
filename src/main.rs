use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use dropout_risk::db::{self, PgStore};
use dropout_risk::recommend::RecommendationGenerator;
use dropout_risk::{
    offline, report, DataSources, EngineConfig, PredictionOrchestrator, PredictionRequest,
    RiskScorer,
};

#[derive(Parser)]
#[command(name = "dropout-risk")]
#[command(about = "Rule-based dropout risk prediction for enrolled students", long_about = None)]
struct Cli {
    /// JSON file overriding weights, thresholds and feature defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 5)]
    max_connections: u32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Predict dropout risk for one student, a list, or every active student
    Predict {
        #[arg(long)]
        student_id: Option<Uuid>,
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<Uuid>>,
        #[arg(long)]
        all: bool,
        /// Abort the whole batch when any student fails
        #[arg(long)]
        strict: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Number of students listed in text output; JSON output is never truncated
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Score feature rows from a CSV file without a database
    Score {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown report for all active students
    Report {
        #[arg(long, default_value = "dropout-report.md")]
        out: PathBuf,
    },
}

async fn connect(max_connections: u32) -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn orchestrator(pool: PgPool, config: &EngineConfig) -> PredictionOrchestrator {
    let sources = DataSources::from_store(Arc::new(PgStore::new(pool)));
    PredictionOrchestrator::new(sources, config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::InitDb => {
            let pool = connect(cli.max_connections).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(cli.max_connections).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Predict {
            student_id,
            ids,
            all,
            strict,
            format,
            limit,
        } => {
            let request = PredictionRequest::from_parts(student_id, ids, all)
                .map_err(|err| anyhow::anyhow!("Error predicting dropout risk: {err}"))?;
            let pool = connect(cli.max_connections).await?;
            let response = orchestrator(pool, &config)
                .execute(&request, strict)
                .await
                .map_err(|err| anyhow::anyhow!("Error predicting dropout risk: {err}"))?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                OutputFormat::Text => print!("{}", report::render_text(&response, limit)),
            }
        }
        Commands::Score { csv } => {
            let scorer = RiskScorer::new(config.scoring.clone());
            let scored = offline::score_csv(&csv, &scorer, &RecommendationGenerator::new())?;
            for failure in &scored.failures {
                tracing::warn!(row = failure.row, reason = %failure.reason, "row not scored");
            }
            println!("{}", serde_json::to_string_pretty(&scored)?);
        }
        Commands::Report { out } => {
            let pool = connect(cli.max_connections).await?;
            let response = orchestrator(pool, &config)
                .execute(&PredictionRequest::All, false)
                .await
                .map_err(|err| anyhow::anyhow!("Error predicting dropout risk: {err}"))?;
            let report = report::build_report(&response, Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
