use crate::transform::{RowTransformer, TransformError};
use bson::Document;
use connectors::mongo::MongoSource;
use connectors::postgres::PgConnection;
use connectors::ConnectorError;
use engine_core::MetricsSnapshot;
use model::{FieldPresence, MappingMode, TableMapping, Value};
use planner::dialect::Postgres;
use planner::Dialect;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

#[derive(Debug, Clone, Copy)]
pub struct RowCountReport {
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_skipped: u64,
    pub matches: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChecksumReport {
    pub sampled: usize,
    pub mismatches: Vec<String>,
}

/// Post-run row-count and sample-checksum comparison (§4.10). Both reports
/// are advisory: a mismatch is logged and returned, it never fails the run.
pub struct Validator {
    mapping: TableMapping,
}

impl Validator {
    pub fn new(mapping: TableMapping) -> Self {
        Self { mapping }
    }

    /// Compares counters accumulated during the run rather than issuing
    /// `COUNT(*)` against either store.
    pub fn validate_row_counts(&self, snapshot: &MetricsSnapshot) -> RowCountReport {
        let accounted = snapshot.rows_written + snapshot.rows_skipped;
        let matches = snapshot.rows_read == accounted;
        if !matches {
            warn!(
                rows_read = snapshot.rows_read,
                rows_written = snapshot.rows_written,
                rows_skipped = snapshot.rows_skipped,
                "row-count validator detected a mismatch"
            );
        }
        RowCountReport {
            rows_read: snapshot.rows_read,
            rows_written: snapshot.rows_written,
            rows_skipped: snapshot.rows_skipped,
            matches,
        }
    }

    /// Samples up to `sample_size` source documents, transforms each the
    /// same way the write path does, and compares field-by-field against
    /// what is read back from the target by primary key.
    pub async fn validate_checksums(
        &self,
        source: &MongoSource,
        target: &PgConnection,
        sample_size: usize,
    ) -> Result<ChecksumReport, ValidatorError> {
        let sampled = source.sample_documents(sample_size).await?;
        let transformer = RowTransformer::new(self.mapping.clone());
        let target_columns = transformer.target_columns();
        let mut mismatches = Vec::new();

        for doc in &sampled {
            let expected = transformer.transform(doc)?;
            let key_label = doc.get("_id").map(|v| v.to_string()).unwrap_or_default();

            match self.fetch_target_row(target, &target_columns, &expected).await? {
                None => mismatches.push(format!("{key_label}: missing on target")),
                Some(actual) => {
                    let differs = expected
                        .iter()
                        .zip(actual.iter())
                        .any(|(e, a)| field_text(e) != *a);
                    if differs {
                        mismatches.push(format!("{key_label}: field mismatch"));
                    }
                }
            }
        }

        if !mismatches.is_empty() {
            warn!(count = mismatches.len(), "checksum validator found mismatches");
        }

        Ok(ChecksumReport {
            sampled: sampled.len(),
            mismatches,
        })
    }

    /// Looks up the target row matching `expected`'s primary-key columns and
    /// re-encodes it as `FieldPresence` in the same column order, so it can
    /// be compared directly against the transformed source row.
    async fn fetch_target_row(
        &self,
        target: &PgConnection,
        target_columns: &[String],
        expected: &[FieldPresence],
    ) -> Result<Option<Vec<Option<String>>>, ValidatorError> {
        let key_columns = match self.mapping.mode {
            MappingMode::Jsonb => vec![self.mapping.id_column.clone()],
            MappingMode::Columns => self.mapping.primary_key.clone(),
        };

        let dialect = Postgres;
        let mut params = Vec::with_capacity(key_columns.len());
        let mut conditions = Vec::with_capacity(key_columns.len());
        for key_column in &key_columns {
            let Some(position) = target_columns.iter().position(|c| c == key_column) else {
                continue;
            };
            let value = expected[position].clone().into_value();
            params.push(value);
            conditions.push(format!(
                "{} = ${}",
                dialect.quote_identifier(key_column),
                params.len()
            ));
        }
        if conditions.is_empty() {
            return Ok(None);
        }

        let select_list = target_columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_list} FROM {}.{} WHERE {}",
            dialect.quote_identifier(&self.mapping.target_schema),
            dialect.quote_identifier(&self.mapping.target_table),
            conditions.join(" AND ")
        );

        let Some(row) = target.query_opt(&sql, params).await? else {
            return Ok(None);
        };

        Ok(Some(row_to_text(&row, target_columns.len())))
    }
}

/// Reads every column back as text (`::text` cast by the caller's column
/// list is not needed since the driver coerces on `try_get`), so comparison
/// doesn't have to match Postgres's wire type per column.
fn row_to_text(row: &tokio_postgres::Row, column_count: usize) -> Vec<Option<String>> {
    (0..column_count)
        .map(|i| row.try_get::<_, Option<String>>(i).unwrap_or(None))
        .collect()
}

/// Canonical text form of a transformed field, matching how `row_to_text`
/// reads the same column back from the target.
fn field_text(field: &FieldPresence) -> Option<String> {
    match field {
        FieldPresence::Missing | FieldPresence::Null => None,
        FieldPresence::Present(Value::Null) => None,
        FieldPresence::Present(value) => Some(match value {
            Value::String(s) => s.clone(),
            Value::Json(v) => v.to_string(),
            Value::Boolean(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Uuid(v) => v.to_string(),
            Value::Date(d) => d.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339(),
            Value::Bytes(b) => format!("{b:?}"),
            Value::Null => unreachable!(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Metrics;

    #[test]
    fn row_count_validator_flags_mismatch() {
        let mapping = TableMapping {
            source_database: "app".into(),
            source_collection: "users".into(),
            target_schema: "public".into(),
            target_table: "users".into(),
            mode: MappingMode::Jsonb,
            columns: vec![],
            rename: model::NameMap::default(),
            type_coercion: Default::default(),
            primary_key: vec!["id".into()],
            constant_columns: Default::default(),
            id_column: "id".into(),
            doc_column: "doc".into(),
        };
        let validator = Validator::new(mapping);

        let metrics = Metrics::new();
        metrics.increment_rows_read(10);
        metrics.increment_rows_written(8);
        let report = validator.validate_row_counts(&metrics.snapshot());
        assert!(!report.matches);

        let metrics = Metrics::new();
        metrics.increment_rows_read(10);
        metrics.increment_rows_written(8);
        metrics.increment_rows_skipped(2);
        let report = validator.validate_row_counts(&metrics.snapshot());
        assert!(report.matches);
    }
}
