use crate::error::RuntimeError;
use connectors::mongo::MongoSource;
use engine_core::CheckpointStore;
use model::{RunType, ShardDescriptor};
use tracing::info;

/// Resolves the set of shards a run must process (§4.8). A fresh run asks
/// the source to partition the collection and persists each shard as
/// NOT_STARTED; a resume run trusts the rows `CheckpointStore::begin_run`
/// already copied forward from `prev_run_id` and never re-partitions.
pub struct ShardPlanner<'a> {
    source: &'a MongoSource,
    checkpoint: &'a CheckpointStore,
}

impl<'a> ShardPlanner<'a> {
    pub fn new(source: &'a MongoSource, checkpoint: &'a CheckpointStore) -> Self {
        Self { source, checkpoint }
    }

    pub async fn plan(
        &self,
        table_name: &str,
        run_id: i64,
        run_type: RunType,
        shard_count: u32,
        partition_field: Option<&str>,
        partition_strategy: Option<&str>,
    ) -> Result<Vec<ShardDescriptor>, RuntimeError> {
        match run_type {
            RunType::Resume => {
                let pending = self.checkpoint.list_pending(table_name, run_id).await?;
                info!(
                    table_name,
                    run_id,
                    count = pending.len(),
                    "resumed pending shards from checkpoint store"
                );
                Ok(pending
                    .into_iter()
                    .map(|record| ShardDescriptor::new(record.shard_id, record.lower_bound, record.upper_bound))
                    .collect())
            }
            RunType::New => {
                let shards = self
                    .source
                    .plan_shards(shard_count, partition_field, partition_strategy)
                    .await?;
                for shard in &shards {
                    self.checkpoint.insert_pending_shard(table_name, run_id, shard).await?;
                }
                info!(table_name, run_id, count = shards.len(), "planned fresh shards");
                Ok(shards)
            }
        }
    }
}
