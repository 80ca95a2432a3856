mod error;
mod shutdown;

use clap::Parser;
use config::Settings;
use engine_runtime::MigrationDriver;
use error::CliError;
use shutdown::ShutdownCoordinator;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs one migration pass described by a properties file (§6). There are no
/// subcommands: every behavior (resume vs. fresh run, validation, insert
/// mode) is a property, not a flag.
#[derive(Debug, Parser)]
#[command(name = "migrate", about = "Runs a MongoDB to YugabyteDB/Postgres migration from a properties file")]
struct Cli {
    /// Path to the migration's .properties file.
    properties: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let exit_code = match run().await {
        Ok(()) => 0,
        Err(err) => {
            error!(%err, "migration run did not complete successfully");
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let now_epoch_seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before unix epoch")
        .as_secs() as i64;

    let props = config::properties::load(&cli.properties, now_epoch_seconds).map_err(CliError::Config)?;
    let settings = Settings::from_properties(&props, now_epoch_seconds)?;

    let cancel = CancellationToken::new();
    let shutdown = ShutdownCoordinator::new(cancel.clone());
    shutdown.register_handlers();

    let driver = MigrationDriver::new(settings, cancel);
    let summary = driver.run().await?;

    info!(
        run_id = summary.run_id,
        status = %summary.status.as_db_str(),
        rows_read = summary.metrics.rows_read,
        rows_written = summary.metrics.rows_written,
        rows_skipped = summary.metrics.rows_skipped,
        partitions_completed = summary.metrics.partitions_completed,
        partitions_failed = summary.metrics.partitions_failed,
        "migration summary"
    );

    if let Some(report) = summary.row_count_report {
        info!(matches = report.matches, rows_read = report.rows_read, rows_written = report.rows_written, rows_skipped = report.rows_skipped, "row count validation");
    }
    if let Some(report) = summary.checksum_report {
        if report.mismatches.is_empty() {
            info!(sampled = report.sampled, "checksum validation passed");
        } else {
            for mismatch in &report.mismatches {
                error!(%mismatch, "checksum mismatch");
            }
        }
    }

    if shutdown.is_shutdown_requested() {
        return Err(CliError::ShutdownRequested);
    }

    Ok(())
}
