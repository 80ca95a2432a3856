pub mod checkpoint;
pub mod error;
pub mod metrics;
pub mod retry;

pub use checkpoint::CheckpointStore;
pub use error::{CheckpointError, DriverError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use retry::{RetryConfig, RetryDisposition, RetryError, RetryPolicy};
