use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("connector error: {0}")]
    Connector(#[from] connectors::ConnectorError),

    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] engine_core::CheckpointError),

    #[error("writer error: {0}")]
    Writer(#[from] engine_processing::WriterError),

    #[error("transform error: {0}")]
    Transform(#[from] engine_processing::TransformError),

    #[error("validation error: {0}")]
    Validation(#[from] engine_processing::ValidatorError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("shard worker cancelled")]
    Cancelled,

    #[error("shard {0} exhausted its retry budget: {1}")]
    RetryExhausted(u32, String),
}
