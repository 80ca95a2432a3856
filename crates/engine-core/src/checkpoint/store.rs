use crate::checkpoint::models::ShardRecord;
use crate::error::CheckpointError;
use chrono::Utc;
use connectors::PgConnection;
use model::{RunStatus, RunType, ShardDescriptor, ShardStatus};
use std::str::FromStr;
use tracing::{info, warn};

const RUN_TABLE: &str = "migration_run";
const SHARD_TABLE: &str = "migration_shard";

/// Durable run/shard progress tracking inside the target store (§4.6).
///
/// Grounded on the same transactional check-then-set shape the corpus's
/// embedded-KV checkpoint store uses (claim only succeeds from a known prior
/// state), re-expressed as `UPDATE ... WHERE status = ... RETURNING` against
/// real tables, since these records must live in the target store rather
/// than in a local embedded database.
pub struct CheckpointStore {
    conn: PgConnection,
}

impl CheckpointStore {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub async fn initialize(&self) -> Result<(), CheckpointError> {
        self.conn
            .exec(&format!(
                "CREATE TABLE IF NOT EXISTS {RUN_TABLE} (
                    table_name TEXT NOT NULL,
                    run_id BIGINT NOT NULL,
                    run_type TEXT NOT NULL,
                    prev_run_id BIGINT NOT NULL,
                    start_time TIMESTAMPTZ NOT NULL,
                    end_time TIMESTAMPTZ,
                    run_info TEXT,
                    status TEXT NOT NULL,
                    PRIMARY KEY (table_name, run_id)
                );
                CREATE INDEX IF NOT EXISTS {RUN_TABLE}_status_idx ON {RUN_TABLE} (table_name, status);

                CREATE TABLE IF NOT EXISTS {SHARD_TABLE} (
                    table_name TEXT NOT NULL,
                    run_id BIGINT NOT NULL,
                    start_time TIMESTAMPTZ,
                    lower_bound TEXT NOT NULL,
                    upper_bound TEXT NOT NULL,
                    shard_id INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    run_info TEXT,
                    PRIMARY KEY (table_name, run_id, lower_bound, shard_id)
                );
                CREATE INDEX IF NOT EXISTS {SHARD_TABLE}_status_idx ON {SHARD_TABLE} (table_name, run_id, status);"
            ))
            .await?;
        Ok(())
    }

    /// Inserts the run row in STARTED and, for a resume, migrates every
    /// non-terminal shard record from `prev_run_id` into `run_id` under
    /// NOT_STARTED. PASS records from the previous run are not copied
    /// (§9, resolved ambiguity b): they're already done.
    pub async fn begin_run(
        &self,
        table_name: &str,
        run_id: i64,
        prev_run_id: i64,
    ) -> Result<RunType, CheckpointError> {
        let run_type = if prev_run_id == 0 { RunType::New } else { RunType::Resume };

        self.conn
            .exec_params(
                &format!(
                    "INSERT INTO {RUN_TABLE} (table_name, run_id, run_type, prev_run_id, start_time, status)
                     VALUES ($1, $2, $3, $4, $5, $6)"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                    model::Value::String(if prev_run_id == 0 { "NEW" } else { "RESUME" }.to_string()),
                    model::Value::Int(prev_run_id),
                    model::Value::Timestamp(Utc::now()),
                    model::Value::String(RunStatus::Started.as_db_str().to_string()),
                ],
            )
            .await?;

        if prev_run_id != 0 {
            let rows = self
                .conn
                .query(
                    &format!(
                        "SELECT lower_bound, upper_bound, shard_id FROM {SHARD_TABLE}
                         WHERE table_name = $1 AND run_id = $2 AND status IN ('NOT_STARTED', 'STARTED', 'FAIL')"
                    ),
                    vec![
                        model::Value::String(table_name.to_string()),
                        model::Value::Int(prev_run_id),
                    ],
                )
                .await?;

            for row in &rows {
                let lower: String = row.get(0);
                let upper: String = row.get(1);
                let shard_id: i32 = row.get(2);
                self.insert_pending_shard(
                    table_name,
                    run_id,
                    &ShardDescriptor::new(shard_id as u32, lower, upper),
                )
                .await?;
            }
            info!(table_name, run_id, prev_run_id, migrated = rows.len(), "resumed pending shards");
        }

        Ok(run_type)
    }

    pub async fn insert_pending_shard(
        &self,
        table_name: &str,
        run_id: i64,
        shard: &ShardDescriptor,
    ) -> Result<(), CheckpointError> {
        self.conn
            .exec_params(
                &format!(
                    "INSERT INTO {SHARD_TABLE} (table_name, run_id, lower_bound, upper_bound, shard_id, status)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT (table_name, run_id, lower_bound, shard_id) DO NOTHING"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                    model::Value::String(shard.lower_bound.clone()),
                    model::Value::String(shard.upper_bound.clone()),
                    model::Value::Int(shard.shard_id as i64),
                    model::Value::String(ShardStatus::NotStarted.as_db_str().to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Transitions exactly one shard NOT_STARTED -> STARTED. Contention
    /// between two workers racing for the same shard is resolved by the
    /// `WHERE status = 'NOT_STARTED'` guard: at most one UPDATE matches.
    pub async fn claim_shard(
        &self,
        table_name: &str,
        run_id: i64,
        shard_id: u32,
    ) -> Result<bool, CheckpointError> {
        let affected = self
            .conn
            .exec_params(
                &format!(
                    "UPDATE {SHARD_TABLE} SET status = 'STARTED', start_time = $4
                     WHERE table_name = $1 AND run_id = $2 AND shard_id = $3 AND status = 'NOT_STARTED'"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                    model::Value::Int(shard_id as i64),
                    model::Value::Timestamp(Utc::now()),
                ],
            )
            .await?;
        Ok(affected == 1)
    }

    pub async fn complete_shard(
        &self,
        table_name: &str,
        run_id: i64,
        shard_id: u32,
        status: ShardStatus,
        info: Option<String>,
    ) -> Result<(), CheckpointError> {
        debug_assert!(status.is_terminal());
        self.conn
            .exec_params(
                &format!(
                    "UPDATE {SHARD_TABLE} SET status = $4, run_info = $5
                     WHERE table_name = $1 AND run_id = $2 AND shard_id = $3
                       AND status IN ('STARTED', $4)"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                    model::Value::Int(shard_id as i64),
                    model::Value::String(status.as_db_str().to_string()),
                    model::Value::String(info.unwrap_or_default()),
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn end_run(&self, table_name: &str, run_id: i64, summary: &str) -> Result<RunStatus, CheckpointError> {
        let pending = self.list_pending(table_name, run_id).await?;
        let failed = self
            .conn
            .query(
                &format!("SELECT 1 FROM {SHARD_TABLE} WHERE table_name = $1 AND run_id = $2 AND status = 'FAIL'"),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                ],
            )
            .await?;

        let status = if pending.is_empty() && failed.is_empty() {
            RunStatus::Pass
        } else {
            if !pending.is_empty() {
                warn!(table_name, run_id, pending = pending.len(), "run ended with pending shards");
            }
            RunStatus::Fail
        };

        self.conn
            .exec_params(
                &format!(
                    "UPDATE {RUN_TABLE} SET end_time = $3, status = $4, run_info = $5
                     WHERE table_name = $1 AND run_id = $2"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                    model::Value::Timestamp(Utc::now()),
                    model::Value::String(status.as_db_str().to_string()),
                    model::Value::String(summary.to_string()),
                ],
            )
            .await?;

        Ok(status)
    }

    pub async fn list_pending(
        &self,
        table_name: &str,
        run_id: i64,
    ) -> Result<Vec<ShardRecord>, CheckpointError> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT table_name, run_id, lower_bound, upper_bound, shard_id, status, run_info
                     FROM {SHARD_TABLE}
                     WHERE table_name = $1 AND run_id = $2 AND status IN ('NOT_STARTED', 'STARTED')"
                ),
                vec![
                    model::Value::String(table_name.to_string()),
                    model::Value::Int(run_id),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| {
                let status_str: String = row.get(5);
                let status = ShardStatus::from_str(&status_str)
                    .map_err(|_| CheckpointError::RunNotFound(run_id))?;
                Ok(ShardRecord {
                    table_name: row.get(0),
                    run_id: row.get(1),
                    lower_bound: row.get(2),
                    upper_bound: row.get(3),
                    shard_id: row.get::<_, i32>(4) as u32,
                    status,
                    start_time: None,
                    run_info: row.get(6),
                })
            })
            .collect()
    }
}
