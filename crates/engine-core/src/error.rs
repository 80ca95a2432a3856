use connectors::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint store connection failed: {0}")]
    Connection(#[from] ConnectorError),

    #[error("shard {shard_id} in run {run_id} was already claimed")]
    AlreadyClaimed { run_id: i64, shard_id: u32 },

    #[error("run {0} has no row in the run table")]
    RunNotFound(i64),
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("mapping error: {0}")]
    Mapping(#[from] model::mapping::MappingError),
}
