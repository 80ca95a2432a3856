pub mod models;
pub mod store;

pub use models::{RunRecord, ShardRecord};
pub use store::CheckpointStore;
