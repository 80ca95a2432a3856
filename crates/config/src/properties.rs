use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Environment variables that may override a properties-file value. This is
/// an exhaustive list (§6): no other env var is consulted, so the
/// command-line argument remains authoritative elsewhere.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MIGRATION_RUN_ID", "migration.runId"),
    ("MIGRATION_PREV_RUN_ID", "migration.prevRunId"),
    ("YUGABYTE_PASSWORD", "yugabyte.password"),
    ("MONGO_URI", "mongo.uri"),
];

/// Parses a Java-style `.properties` file: `key = value` pairs, `#`/`!`
/// comment lines, blank lines ignored. `${timestamp}` in any value is
/// replaced with seconds since epoch at load time.
pub fn load(path: impl AsRef<Path>, now_epoch_seconds: i64) -> Result<HashMap<String, String>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut props = parse(&text);
    substitute_timestamp(&mut props, now_epoch_seconds);
    apply_env_overrides(&mut props);
    Ok(props)
}

fn parse(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }
        let Some(sep) = trimmed.find(['=', ':']) else {
            continue;
        };
        let key = trimmed[..sep].trim().to_string();
        let value = trimmed[sep + 1..].trim().to_string();
        props.insert(key, value);
    }
    props
}

fn substitute_timestamp(props: &mut HashMap<String, String>, now_epoch_seconds: i64) {
    let token = now_epoch_seconds.to_string();
    for value in props.values_mut() {
        if value.contains("${timestamp}") {
            *value = value.replace("${timestamp}", &token);
        }
    }
}

fn apply_env_overrides(props: &mut HashMap<String, String>) {
    for (env_var, key) in ENV_OVERRIDES {
        if let Ok(value) = std::env::var(env_var) {
            props.insert((*key).to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_comments_and_pairs() {
        let text = "# comment\n! also comment\n\nyugabyte.host = 127.0.0.1\nmongo.uri=mongodb://x\n";
        let props = parse(text);
        assert_eq!(props.get("yugabyte.host").unwrap(), "127.0.0.1");
        assert_eq!(props.get("mongo.uri").unwrap(), "mongodb://x");
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn substitutes_timestamp_placeholder() {
        let mut props = HashMap::new();
        props.insert("migration.runId".to_string(), "run-${timestamp}".to_string());
        substitute_timestamp(&mut props, 1_700_000_000);
        assert_eq!(props.get("migration.runId").unwrap(), "run-1700000000");
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration.properties");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "mongo.uri = mongodb://localhost").unwrap();
        let props = load(&path, 0).unwrap();
        assert_eq!(props.get("mongo.uri").unwrap(), "mongodb://localhost");
    }
}
