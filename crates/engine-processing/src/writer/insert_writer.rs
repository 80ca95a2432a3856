use super::{WriteOutcome, WriterError};
use async_trait::async_trait;
use connectors::postgres::PgConnection;
use model::{FieldPresence, TableMapping, Value};
use planner::ast::{ConflictAction, Expr, Insert, OnConflict, TableRef};
use planner::dialect::Postgres;
use planner::{Dialect, Render, Renderer};

/// Executes one parameterized `INSERT ... ON CONFLICT DO NOTHING` per call
/// (§4.5). Requires a primary key, since conflict detection is how
/// at-most-once semantics are enforced on resume.
pub struct InsertWriter {
    conn: PgConnection,
    table: TableRef,
    columns: Vec<String>,
    primary_key: Vec<String>,
}

impl InsertWriter {
    pub fn new(conn: PgConnection, mapping: &TableMapping, columns: &[String]) -> Result<Self, WriterError> {
        if mapping.primary_key.is_empty() {
            return Err(WriterError::MissingPrimaryKey);
        }
        Ok(Self {
            conn,
            table: TableRef::new(mapping.target_schema.clone(), mapping.target_table.clone()),
            columns: columns.to_vec(),
            primary_key: mapping.primary_key.clone(),
        })
    }
}

#[async_trait]
impl super::ShardWriter for InsertWriter {
    async fn write_rows(&mut self, rows: &[Vec<FieldPresence>]) -> Result<WriteOutcome, WriterError> {
        if rows.is_empty() {
            return Ok(WriteOutcome::default());
        }

        let values: Vec<Vec<Expr>> = rows
            .iter()
            .map(|row| row.iter().map(|field| Expr::Value(field_to_value(field))).collect())
            .collect();

        let ast = Insert {
            table: self.table.clone(),
            columns: self.columns.clone(),
            values,
            on_conflict: Some(OnConflict {
                columns: self.primary_key.clone(),
                action: ConflictAction::DoNothing,
            }),
        };

        let dialect = Postgres;
        let mut renderer = Renderer::new(&dialect);
        ast.render(&mut renderer);
        let (sql, params) = renderer.finish();

        let affected = self.conn.exec_params(&sql, params).await?;
        let attempted = rows.len() as u64;
        Ok(WriteOutcome {
            rows_written: affected,
            rows_skipped: attempted.saturating_sub(affected),
        })
    }

    async fn finish(&mut self) -> Result<(), WriterError> {
        Ok(())
    }
}

fn field_to_value(field: &FieldPresence) -> Value {
    match field {
        FieldPresence::Missing | FieldPresence::Null => Value::Null,
        FieldPresence::Present(value) => value.clone(),
    }
}
