pub mod copy_writer;
pub mod insert_writer;

use async_trait::async_trait;
use model::FieldPresence;
use thiserror::Error;

pub use copy_writer::CopyWriter;
pub use insert_writer::InsertWriter;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("connector error: {0}")]
    Connector(#[from] connectors::ConnectorError),

    #[error("table has no primary key; batch-insert requires one")]
    MissingPrimaryKey,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOutcome {
    pub rows_written: u64,
    pub rows_skipped: u64,
}

/// Common seam the worker loop writes through regardless of `insertMode`
/// (§4.5). The two implementations share no state: mode is fixed for the
/// whole run, not auto-detected per batch.
#[async_trait]
pub trait ShardWriter: Send {
    async fn write_rows(&mut self, rows: &[Vec<FieldPresence>]) -> Result<WriteOutcome, WriterError>;

    /// Called once after the shard's rows have all been handed to
    /// `write_rows`; flushes and commits any still-open transaction.
    async fn finish(&mut self) -> Result<(), WriterError>;
}
