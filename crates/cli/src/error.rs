use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read properties file {path}: {source}")]
    PropertiesIo { path: String, source: std::io::Error },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("migration run failed: {0}")]
    Runtime(#[from] engine_runtime::RuntimeError),

    #[error("shutdown requested")]
    ShutdownRequested,
}

impl CliError {
    /// Maps to the process exit code documented in §6: 0 is handled by the
    /// caller on `Ok`, 2 is reserved for configuration errors, 130 for a
    /// cancelled run, everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::PropertiesIo { .. } => 2,
            CliError::ShutdownRequested => 130,
            CliError::Runtime(_) => 1,
        }
    }
}
