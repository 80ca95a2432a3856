pub mod transform;
pub mod validator;
pub mod writer;

pub use transform::{RowTransformer, TransformError};
pub use validator::{ChecksumReport, RowCountReport, Validator, ValidatorError};
pub use writer::{CopyWriter, InsertWriter, ShardWriter, WriteOutcome, WriterError};
