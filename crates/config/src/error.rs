use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read properties file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required property: {0}")]
    MissingKey(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("table mapping error: {0}")]
    Mapping(#[from] model::mapping::MappingError),

    #[error("validation failed: {0}")]
    ValidationFailed(String),
}
