pub mod data_type;
pub mod field;
pub mod mapping;
pub mod run;
pub mod shard;
pub mod value;

pub use data_type::DataType;
pub use field::{FieldPresence, FieldValue};
pub use mapping::{MappingMode, NameMap, TableMapping};
pub use run::{RunStatus, RunType, ShardStatus};
pub use shard::ShardDescriptor;
pub use value::Value;
