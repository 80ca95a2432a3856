use crate::error::ConfigError;
use model::{MappingMode, TableMapping};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Copy,
    Insert,
}

#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub batch_size: u32,
    pub partition_field: Option<String>,
    pub partition_strategy: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YugabyteSettings {
    pub hosts: Vec<String>,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub load_balance_hosts: bool,
    pub insert_mode: InsertMode,
    pub insert_batch_size: usize,
    pub copy_buffer_size: usize,
    pub copy_flush_every: usize,
    pub csv_delimiter: char,
    pub csv_null: String,
    pub csv_quote: char,
    pub csv_escape: char,
    pub truncate_target_table: bool,
    pub isolation_level: String,
    pub auto_commit: bool,
}

#[derive(Debug, Clone)]
pub struct MigrationSettings {
    pub run_id: i64,
    pub prev_run_id: i64,
    pub checkpoint_enabled: bool,
    pub validation_enabled: bool,
    pub validation_sample_size: usize,
    pub parallelism: usize,
    pub retry_max_attempts: usize,
    pub retry_initial_delay_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mongo: MongoSettings,
    pub yugabyte: YugabyteSettings,
    pub table: TableMapping,
    pub migration: MigrationSettings,
}

impl Settings {
    pub fn from_properties(props: &HashMap<String, String>, now_epoch_seconds: i64) -> Result<Self, ConfigError> {
        let mongo = MongoSettings {
            uri: require(props, "mongo.uri")?,
            database: require(props, "mongo.database")?,
            collection: require(props, "mongo.collection")?,
            batch_size: parse_or(props, "mongo.batchSize", 1000)?,
            partition_field: props.get("mongo.partition.field").cloned(),
            partition_strategy: props.get("mongo.partition.strategy").cloned(),
        };

        let insert_mode = match props.get("yugabyte.insertMode").map(String::as_str) {
            Some("INSERT") => InsertMode::Insert,
            Some("COPY") | None => InsertMode::Copy,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "yugabyte.insertMode".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let yugabyte = YugabyteSettings {
            hosts: require(props, "yugabyte.host")?
                .split(',')
                .map(|h| h.trim().to_string())
                .collect(),
            port: parse_or(props, "yugabyte.port", 5433)?,
            database: require(props, "yugabyte.database")?,
            username: require(props, "yugabyte.username")?,
            password: props.get("yugabyte.password").cloned().unwrap_or_default(),
            load_balance_hosts: parse_or(props, "yugabyte.loadBalanceHosts", false)?,
            insert_mode,
            insert_batch_size: parse_or(props, "yugabyte.insertBatchSize", 1000)?,
            copy_buffer_size: parse_or(props, "yugabyte.copyBufferSize", 1000)?,
            copy_flush_every: parse_or(props, "yugabyte.copyFlushEvery", 500)?,
            csv_delimiter: char_or(props, "yugabyte.csvDelimiter", ',')?,
            csv_null: props.get("yugabyte.csvNull").cloned().unwrap_or_default(),
            csv_quote: char_or(props, "yugabyte.csvQuote", '"')?,
            csv_escape: char_or(props, "yugabyte.csvEscape", '"')?,
            truncate_target_table: parse_or(props, "yugabyte.truncateTargetTable", false)?,
            isolation_level: props
                .get("yugabyte.isolationLevel")
                .cloned()
                .unwrap_or_else(|| "READ COMMITTED".to_string()),
            auto_commit: parse_or(props, "yugabyte.autoCommit", false)?,
        };

        let mode = match props.get("mapping.mode").map(String::as_str) {
            Some("COLUMNS") => MappingMode::Columns,
            Some("JSONB") | None => MappingMode::Jsonb,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "mapping.mode".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let columns = props
            .get("table.columns")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();

        let rename_pairs: Vec<(String, String)> = props
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("table.columnMapping.")
                    .map(|src| (src.to_string(), v.clone()))
            })
            .collect();

        let type_coercion: HashMap<String, String> = props
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("table.typeMapping.")
                    .map(|src_type| (src_type.to_string(), v.clone()))
            })
            .collect();

        let constant_names = split_csv(props.get("table.constantColumns.names"));
        let constant_values = split_csv(props.get("table.constantColumns.values"));
        let constant_columns = TableMapping::build_constant_columns(&constant_names, &constant_values)?;

        let table = TableMapping {
            source_database: mongo.database.clone(),
            source_collection: mongo.collection.clone(),
            target_schema: props
                .get("table.target.schema")
                .cloned()
                .unwrap_or_else(|| "public".to_string()),
            target_table: require(props, "table.target.table")?,
            mode,
            columns,
            rename: model::NameMap::new(rename_pairs),
            type_coercion,
            primary_key: split_csv(props.get("table.primaryKey")),
            constant_columns,
            id_column: props
                .get("mapping.idColumn")
                .cloned()
                .unwrap_or_else(|| "id".to_string()),
            doc_column: props
                .get("mapping.docColumn")
                .cloned()
                .unwrap_or_else(|| "doc".to_string()),
        };

        let migration = MigrationSettings {
            run_id: parse_or(props, "migration.runId", now_epoch_seconds)?,
            prev_run_id: parse_or(props, "migration.prevRunId", 0)?,
            checkpoint_enabled: parse_or(props, "migration.checkpoint.enabled", true)?,
            validation_enabled: parse_or(props, "migration.validation.enabled", true)?,
            validation_sample_size: parse_or(props, "migration.validation.sampleSize", 100)?,
            parallelism: parse_or(props, "migration.parallelism", 4)?,
            retry_max_attempts: parse_or(props, "migration.retry.maxAttempts", 3)?,
            retry_initial_delay_ms: parse_or(props, "migration.retry.initialDelayMs", 100)?,
        };

        let settings = Self {
            mongo,
            yugabyte,
            table,
            migration,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Fails fast before any side effect (§7: configuration errors are
    /// fatal and must surface before a connection is even opened).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.yugabyte.hosts.is_empty() {
            return Err(ConfigError::MissingKey("yugabyte.host".to_string()));
        }
        if self.migration.parallelism == 0 {
            return Err(ConfigError::ValidationFailed(
                "migration.parallelism must be >= 1".to_string(),
            ));
        }
        self.table.validate()?;
        if self.yugabyte.insert_mode == InsertMode::Insert && self.table.primary_key.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "yugabyte.insertMode=INSERT requires table.primaryKey".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.migration.retry_initial_delay_ms)
    }
}

fn require(props: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    props
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn parse_or<T: std::str::FromStr>(
    props: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v.clone(),
        }),
    }
}

fn char_or(props: &HashMap<String, String>, key: &str, default: char) -> Result<char, ConfigError> {
    match props.get(key) {
        None => Ok(default),
        Some(v) => v.chars().next().ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: v.clone(),
        }),
    }
}

fn split_csv(value: Option<&String>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(v) if v.is_empty() => Vec::new(),
        Some(v) => v.split(',').map(|s| s.trim().to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_props() -> HashMap<String, String> {
        let mut p = HashMap::new();
        p.insert("mongo.uri".into(), "mongodb://localhost".into());
        p.insert("mongo.database".into(), "app".into());
        p.insert("mongo.collection".into(), "users".into());
        p.insert("yugabyte.host".into(), "10.0.0.1,10.0.0.2".into());
        p.insert("yugabyte.database".into(), "app".into());
        p.insert("yugabyte.username".into(), "admin".into());
        p.insert("table.target.table".into(), "users".into());
        p
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let settings = Settings::from_properties(&base_props(), 1_700_000_000).unwrap();
        assert_eq!(settings.yugabyte.hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(settings.yugabyte.insert_mode, InsertMode::Copy);
        assert_eq!(settings.migration.parallelism, 4);
        assert_eq!(settings.table.mode, MappingMode::Jsonb);
    }

    #[test]
    fn rejects_insert_mode_without_primary_key() {
        let mut props = base_props();
        props.insert("yugabyte.insertMode".into(), "INSERT".into());
        let err = Settings::from_properties(&props, 0).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
    }

    #[test]
    fn mismatched_constant_columns_fail_fast() {
        let mut props = base_props();
        props.insert("table.constantColumns.names".into(), "a,b".into());
        props.insert("table.constantColumns.values".into(), "1".into());
        let err = Settings::from_properties(&props, 0).unwrap_err();
        assert!(matches!(err, ConfigError::Mapping(_)));
    }
}
