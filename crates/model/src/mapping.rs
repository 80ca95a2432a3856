use std::collections::HashMap;
use thiserror::Error;

/// How a source document's fields are laid out into target columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingMode {
    /// Two columns: an id column and a document column holding the canonical JSON.
    Jsonb,
    /// One column per entry in `TableMapping::columns`, in declared order.
    Columns,
}

/// Case-insensitive bidirectional field rename, mirroring the rename maps
/// used elsewhere in this codebase for source/target column translation.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    source_to_target: HashMap<String, String>,
    target_to_source: HashMap<String, String>,
}

impl NameMap {
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut source_to_target = HashMap::new();
        let mut target_to_source = HashMap::new();
        for (src, tgt) in pairs {
            source_to_target.insert(src.to_ascii_lowercase(), tgt.clone());
            target_to_source.insert(tgt.to_ascii_lowercase(), src);
        }
        Self {
            source_to_target,
            target_to_source,
        }
    }

    /// Target column name for a source field, falling back to the field itself.
    pub fn resolve(&self, source_field: &str) -> String {
        self.source_to_target
            .get(&source_field.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| source_field.to_string())
    }

    pub fn reverse_resolve(&self, target_column: &str) -> String {
        self.target_to_source
            .get(&target_column.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| target_column.to_string())
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("constantColumns.names and constantColumns.values must have equal cardinality, got {names} and {values}")]
    ConstantColumnArityMismatch { names: usize, values: usize },
    #[error("table mapping requires at least one target column in COLUMNS mode")]
    EmptyColumnList,
}

/// Source-to-target contract for one migrated table.
#[derive(Debug, Clone)]
pub struct TableMapping {
    pub source_database: String,
    pub source_collection: String,
    pub target_schema: String,
    pub target_table: String,
    pub mode: MappingMode,
    /// Ordered target column list (COLUMNS mode only).
    pub columns: Vec<String>,
    pub rename: NameMap,
    /// Per-source-type coercion hints, e.g. "date" -> "timestamp".
    pub type_coercion: HashMap<String, String>,
    pub primary_key: Vec<String>,
    /// Target column -> literal value, applied to every row.
    pub constant_columns: HashMap<String, String>,
    pub id_column: String,
    pub doc_column: String,
}

impl TableMapping {
    pub fn qualified_target(&self) -> String {
        format!("{}.{}", self.target_schema, self.target_table)
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        if self.mode == MappingMode::Columns && self.columns.is_empty() {
            return Err(MappingError::EmptyColumnList);
        }
        Ok(())
    }

    /// Builds the constant-columns map from parallel name/value lists,
    /// enforcing the equal-cardinality invariant at construction time.
    pub fn build_constant_columns(
        names: &[String],
        values: &[String],
    ) -> Result<HashMap<String, String>, MappingError> {
        if names.len() != values.len() {
            return Err(MappingError::ConstantColumnArityMismatch {
                names: names.len(),
                values: values.len(),
            });
        }
        Ok(names.iter().cloned().zip(values.iter().cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_constant_column_arity_is_rejected() {
        let err = TableMapping::build_constant_columns(
            &["a".to_string(), "b".to_string()],
            &["1".to_string()],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MappingError::ConstantColumnArityMismatch {
                names: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn rename_is_case_insensitive() {
        let map = NameMap::new([("UserId".to_string(), "user_id".to_string())]);
        assert_eq!(map.resolve("userid"), "userid");
        assert_eq!(map.resolve("UserId"), "user_id");
    }
}
