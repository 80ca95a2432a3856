use chrono::{DateTime, Utc};
use model::{RunStatus, RunType, ShardStatus};

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub table_name: String,
    pub run_id: i64,
    pub prev_run_id: i64,
    pub run_type: RunType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub run_info: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ShardRecord {
    pub table_name: String,
    pub run_id: i64,
    pub shard_id: u32,
    pub lower_bound: String,
    pub upper_bound: String,
    pub start_time: Option<DateTime<Utc>>,
    pub status: ShardStatus,
    pub run_info: Option<String>,
}
