use crate::error::RuntimeError;
use config::{InsertMode, Settings};
use connectors::mongo::MongoSource;
use connectors::postgres::{ConnectionFactory, CsvOptions};
use connectors::{classify_postgres_error, ConnectorError, ErrorClass};
use engine_core::{CheckpointStore, Metrics, RetryDisposition, RetryError, RetryPolicy};
use engine_processing::{CopyWriter, InsertWriter, RowTransformer, ShardWriter, WriterError};
use futures_util::TryStreamExt;
use model::{FieldPresence, ShardDescriptor, ShardStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Executes one shard end-to-end: claim, stream, transform, write, complete
/// (§4.9). Owned by a single tokio task for the shard's whole lifetime; the
/// target-store session it opens is never shared with another worker.
pub async fn run_shard(
    table_name: &str,
    run_id: i64,
    shard: ShardDescriptor,
    settings: &Settings,
    source: &MongoSource,
    checkpoint: &CheckpointStore,
    factory: &ConnectionFactory,
    metrics: &Metrics,
    cancel: CancellationToken,
) -> Result<(), RuntimeError> {
    if !checkpoint.claim_shard(table_name, run_id, shard.shard_id).await? {
        info!(table_name, run_id, shard_id = shard.shard_id, "shard already claimed, skipping");
        return Ok(());
    }

    let retry = RetryPolicy::new(
        settings.migration.retry_max_attempts,
        settings.retry_base_delay(),
        std::time::Duration::from_secs(5),
    );

    let result = execute_shard(&shard, settings, source, factory, metrics, &retry, &cancel).await;

    let (status, run_info) = match &result {
        Ok(()) => (ShardStatus::Pass, None),
        Err(err) => (ShardStatus::Fail, Some(err.to_string())),
    };
    checkpoint
        .complete_shard(table_name, run_id, shard.shard_id, status, run_info)
        .await?;

    match status {
        ShardStatus::Pass => metrics.increment_partitions_completed(),
        _ => metrics.increment_partitions_failed(),
    }

    result
}

async fn execute_shard(
    shard: &ShardDescriptor,
    settings: &Settings,
    source: &MongoSource,
    factory: &ConnectionFactory,
    metrics: &Metrics,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<(), RuntimeError> {
    let transformer = RowTransformer::new(settings.table.clone());
    let columns = transformer.target_columns();

    let conn = factory.connect().await?;
    let mut writer: Box<dyn ShardWriter> = match settings.yugabyte.insert_mode {
        InsertMode::Copy => Box::new(CopyWriter::new(
            conn,
            &settings.table,
            &columns,
            CsvOptions {
                delimiter: settings.yugabyte.csv_delimiter,
                null: settings.yugabyte.csv_null.clone(),
                quote: settings.yugabyte.csv_quote,
                escape: settings.yugabyte.csv_escape,
            },
            settings.yugabyte.isolation_level.clone(),
            settings.yugabyte.auto_commit,
        )),
        InsertMode::Insert => Box::new(InsertWriter::new(conn, &settings.table, &columns)?),
    };

    // copyFlushEvery is the cooperative flush cadence; copyBufferSize is a
    // hard cap on how many rows the in-memory buffer may hold before a flush
    // is forced regardless of cadence (§4.4). Normally flushEvery <=
    // bufferSize and flushEvery alone decides when to flush; if an operator
    // configures a smaller bufferSize, it wins.
    let flush_every = match settings.yugabyte.insert_mode {
        InsertMode::Copy => settings
            .yugabyte
            .copy_flush_every
            .min(settings.yugabyte.copy_buffer_size),
        InsertMode::Insert => settings.yugabyte.insert_batch_size,
    };

    let mut cursor = source.stream_shard(shard, settings.mongo.batch_size).await?;
    let mut batch: Vec<Vec<FieldPresence>> = Vec::with_capacity(flush_every);

    while let Some(doc) = cursor.try_next().await.map_err(ConnectorError::from)? {
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        metrics.increment_rows_read(1);
        batch.push(transformer.transform(&doc)?);

        if batch.len() >= flush_every {
            flush_batch(writer.as_mut(), &mut batch, metrics, retry, cancel, shard.shard_id).await?;
        }
    }
    if !batch.is_empty() {
        flush_batch(writer.as_mut(), &mut batch, metrics, retry, cancel, shard.shard_id).await?;
    }

    writer.finish().await?;
    Ok(())
}

async fn flush_batch(
    writer: &mut dyn ShardWriter,
    batch: &mut Vec<Vec<FieldPresence>>,
    metrics: &Metrics,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
    shard_id: u32,
) -> Result<(), RuntimeError> {
    if cancel.is_cancelled() {
        return Err(RuntimeError::Cancelled);
    }

    let rows = std::mem::take(batch);
    let outcome = retry
        .run(|| writer.write_rows(&rows), classify_writer_error)
        .await
        .map_err(|err| match err {
            RetryError::Fatal(e) => RuntimeError::from(e),
            RetryError::AttemptsExceeded(e) => {
                warn!(shard_id, "shard write exhausted retry budget");
                RuntimeError::RetryExhausted(shard_id, e.to_string())
            }
        })?;

    metrics.increment_rows_written(outcome.rows_written);
    metrics.increment_rows_skipped(outcome.rows_skipped);
    Ok(())
}

fn classify_writer_error(err: &WriterError) -> RetryDisposition {
    match err {
        WriterError::Connector(ConnectorError::Postgres(pg_err)) => {
            match classify_postgres_error(pg_err) {
                ErrorClass::Transient => RetryDisposition::Retry,
                ErrorClass::Fatal => RetryDisposition::Stop,
            }
        }
        _ => RetryDisposition::Stop,
    }
}
