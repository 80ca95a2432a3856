pub mod error;
pub mod properties;
pub mod settings;

pub use error::ConfigError;
pub use settings::{InsertMode, MigrationSettings, MongoSettings, Settings, YugabyteSettings};
