use crate::error::RuntimeError;
use crate::planner::ShardPlanner;
use crate::worker;
use config::Settings;
use connectors::mongo::MongoSource;
use connectors::postgres::{ConnectionFactory, ConnectionFactoryConfig, PgConnection};
use engine_core::{CheckpointStore, Metrics, MetricsSnapshot};
use engine_processing::{ChecksumReport, RowCountReport, Validator};
use model::RunStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: i64,
    pub status: RunStatus,
    pub metrics: MetricsSnapshot,
    pub row_count_report: Option<RowCountReport>,
    pub checksum_report: Option<ChecksumReport>,
}

/// Orchestrates one run end-to-end (§4.9): truncate (if configured),
/// initialize the checkpoint store, begin the run, plan shards, dispatch a
/// bounded pool of workers, then close out the run and validate.
pub struct MigrationDriver {
    settings: Settings,
    cancel: CancellationToken,
}

impl MigrationDriver {
    pub fn new(settings: Settings, cancel: CancellationToken) -> Self {
        Self { settings, cancel }
    }

    pub async fn run(&self) -> Result<RunSummary, RuntimeError> {
        let table_name = self.settings.table.qualified_target();
        let run_id = self.settings.migration.run_id;

        let source = Arc::new(
            MongoSource::connect(
                &self.settings.mongo.uri,
                self.settings.mongo.database.clone(),
                self.settings.mongo.collection.clone(),
            )
            .await?,
        );

        let factory = Arc::new(self.connection_factory()?);
        let checkpoint_conn = factory.connect().await?;
        let checkpoint = Arc::new(CheckpointStore::new(checkpoint_conn));
        checkpoint.initialize().await?;

        if self.settings.yugabyte.truncate_target_table {
            let conn: PgConnection = factory.connect().await?;
            match conn.truncate_table(&table_name).await {
                Ok(()) => info!(%table_name, "truncated target table before run"),
                Err(err) => warn!(%table_name, %err, "failed to truncate target table, continuing (it may not exist yet)"),
            }
        }

        let run_type = checkpoint
            .begin_run(&table_name, run_id, self.settings.migration.prev_run_id)
            .await?;

        let planner = ShardPlanner::new(source.as_ref(), checkpoint.as_ref());
        let shards = planner
            .plan(
                &table_name,
                run_id,
                run_type,
                self.settings.migration.parallelism as u32,
                self.settings.mongo.partition_field.as_deref(),
                self.settings.mongo.partition_strategy.as_deref(),
            )
            .await?;

        let metrics = Metrics::new();
        self.dispatch_workers(&table_name, run_id, shards, source.clone(), checkpoint.clone(), factory.clone(), metrics.clone())
            .await?;

        let snapshot = metrics.snapshot();
        let status = checkpoint
            .end_run(&table_name, run_id, &snapshot.get_summary())
            .await?;
        info!(%table_name, run_id, %status, summary = %snapshot.get_summary(), "run finished");

        let (row_count_report, checksum_report) = if self.settings.migration.validation_enabled {
            let validator = Validator::new(self.settings.table.clone());
            let row_count_report = Some(validator.validate_row_counts(&snapshot));
            let target_conn = factory.connect().await?;
            let checksum_report = validator
                .validate_checksums(&source, &target_conn, self.settings.migration.validation_sample_size)
                .await
                .map_err(|err| {
                    warn!(%err, "checksum validator failed to run, skipping");
                    err
                })
                .ok();
            (row_count_report, checksum_report)
        } else {
            (None, None)
        };

        Ok(RunSummary {
            run_id,
            status,
            metrics: snapshot,
            row_count_report,
            checksum_report,
        })
    }

    /// Spawns one tokio task per shard, bounded by `migration.parallelism`
    /// via an owned semaphore permit (§5: degree of parallelism is the
    /// number of shards scheduled concurrently). Each task opens its own
    /// target-store session through the shared, stateless `factory`.
    async fn dispatch_workers(
        &self,
        table_name: &str,
        run_id: i64,
        shards: Vec<model::ShardDescriptor>,
        source: Arc<MongoSource>,
        checkpoint: Arc<CheckpointStore>,
        factory: Arc<ConnectionFactory>,
        metrics: Metrics,
    ) -> Result<(), RuntimeError> {
        let permits = Arc::new(Semaphore::new(self.settings.migration.parallelism.max(1)));
        let mut handles = Vec::with_capacity(shards.len());

        for shard in shards {
            let permits = permits.clone();
            let table_name = table_name.to_string();
            let settings = self.settings.clone();
            let cancel = self.cancel.clone();
            let source = source.clone();
            let checkpoint = checkpoint.clone();
            let factory = factory.clone();
            let metrics = metrics.clone();

            let permit = permits.acquire_owned().await.expect("semaphore not closed");
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                worker::run_shard(
                    &table_name,
                    run_id,
                    shard,
                    &settings,
                    source.as_ref(),
                    checkpoint.as_ref(),
                    factory.as_ref(),
                    &metrics,
                    cancel,
                )
                .await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(%err, "shard worker returned an error after exhausting its own retries"),
                Err(join_err) => warn!(%join_err, "shard worker task panicked"),
            }
        }
        Ok(())
    }

    fn connection_factory(&self) -> Result<ConnectionFactory, RuntimeError> {
        let config = ConnectionFactoryConfig {
            hosts: self.settings.yugabyte.hosts.clone(),
            port: self.settings.yugabyte.port,
            database: self.settings.yugabyte.database.clone(),
            username: self.settings.yugabyte.username.clone(),
            password: self.settings.yugabyte.password.clone(),
            load_balance_hosts: self.settings.yugabyte.load_balance_hosts,
            tcp_keepalive: true,
            connect_timeout: Duration::from_secs(10),
            socket_timeout: Duration::from_secs(0),
        };
        Ok(ConnectionFactory::new(config)?)
    }
}
