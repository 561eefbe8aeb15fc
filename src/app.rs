use crate::config::Config;
use crate::data::{MemorySink, PgSink, RecordSink};
use crate::harvest::{Pipeline, RunSummary};
use crate::swapi::SwapiClient;
use crate::utils::fmt_duration;
use anyhow::{Context, anyhow};
use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::io::Write;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Where assembled records go for this run.
enum Target {
    Database(PgSink),
    DryRun(MemorySink),
}

/// Owns process setup and teardown around one harvest run.
pub struct App {
    config: Config,
    client: Arc<SwapiClient>,
    target: Target,
}

impl App {
    /// Build the HTTP client and, unless this is a dry run, connect to the
    /// database and apply migrations.
    pub async fn new(config: Config, dry_run: bool) -> Result<Self, anyhow::Error> {
        let client = SwapiClient::new(&config.swapi_base_url, config.request_timeout)
            .context("Failed to create SWAPI client")?;

        let target = if dry_run {
            info!("dry run: records will be printed instead of stored");
            Target::DryRun(MemorySink::new())
        } else {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow!("DATABASE_URL is required unless --dry-run is given"))?;
            Target::Database(PgSink::new(Self::connect(database_url).await?))
        };

        Ok(App {
            config,
            client: Arc::new(client),
            target,
        })
    }

    async fn connect(database_url: &str) -> Result<sqlx::PgPool, anyhow::Error> {
        let connect_options = PgConnectOptions::from_str(database_url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        // One chunk commits at a time, so a single connection does all the work.
        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(4))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;
        info!(max_connections = 2, "database pool established");

        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");

        Ok(db_pool)
    }

    /// Run the harvest and report the outcome as a process exit code.
    pub async fn run(self) -> ExitCode {
        let settings = self.config.harvest_settings();
        info!(
            base_url = %self.config.swapi_base_url,
            ids = ?settings.ids,
            chunk_size = settings.chunk_size,
            reference_concurrency = settings.reference_concurrency,
            "starting harvest"
        );

        let start = Instant::now();
        let pipeline = Pipeline::new(self.client, settings);

        let mut target = self.target;
        let sink: &mut dyn RecordSink = match &mut target {
            Target::Database(sink) => sink,
            Target::DryRun(sink) => sink,
        };
        let result = pipeline.run(sink).await;
        let elapsed = fmt_duration(start.elapsed());

        match result {
            Ok(summary) => {
                log_summary(&summary, &elapsed);
                if let Target::DryRun(sink) = target
                    && let Err(e) = print_records(sink)
                {
                    error!(error = ?e, "Failed to print records");
                    return ExitCode::FAILURE;
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = ?anyhow::Error::from(e), duration = elapsed, "harvest aborted");
                ExitCode::FAILURE
            }
        }
    }
}

fn log_summary(summary: &RunSummary, elapsed: &str) {
    info!(
        chunks = summary.chunks,
        fetched = summary.fetched,
        persisted = summary.persisted,
        not_found = summary.not_found,
        failed = summary.failed,
        rejected = summary.rejected,
        duration = elapsed,
        "harvest complete"
    );
}

fn print_records(sink: MemorySink) -> Result<(), anyhow::Error> {
    let mut stdout = std::io::stdout().lock();
    for record in sink.into_records() {
        serde_json::to_writer(&mut stdout, &record)?;
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}
