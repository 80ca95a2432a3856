use super::{WriteOutcome, WriterError};
use async_trait::async_trait;
use connectors::postgres::{CsvEncoder, CsvOptions, PgConnection};
use model::{FieldPresence, TableMapping};
use planner::ast::{Copy, CopyOption, TableRef};
use planner::dialect::Postgres;
use planner::{Dialect, Render, Renderer};
use tracing::debug;

/// Streams rows through `COPY ... FROM STDIN WITH (FORMAT csv)`, one command
/// per `write_rows` call but all inside a single transaction spanning the
/// whole shard (§4.4): the first call opens it with `BEGIN`, `finish()`
/// commits once at shard completion. A shard that fails partway commits
/// nothing, since the transaction is only ever closed by `finish()` or by
/// the connection dropping (which rolls it back) - so a retried/resumed
/// shard never replays an already-durable row.
///
/// Setting `auto_commit` trades that guarantee away: each `write_rows` call
/// commits its own chunk immediately, so a shard that fails partway keeps
/// whatever it already wrote. An operator who opts into this accepts the
/// duplicate-row risk a resumed run then carries.
pub struct CopyWriter {
    conn: PgConnection,
    encoder: CsvEncoder,
    statement: String,
    delimiter: char,
    isolation_level: String,
    auto_commit: bool,
    began: bool,
}

impl CopyWriter {
    pub fn new(
        conn: PgConnection,
        mapping: &TableMapping,
        columns: &[String],
        csv: CsvOptions,
        isolation_level: impl Into<String>,
        auto_commit: bool,
    ) -> Self {
        let delimiter = csv.delimiter;
        let encoder = CsvEncoder::new(csv);
        let statement = render_copy_statement(mapping, columns);
        debug!(statement, "prepared COPY statement");
        Self {
            conn,
            encoder,
            statement,
            delimiter,
            isolation_level: isolation_level.into(),
            auto_commit,
            began: false,
        }
    }
}

fn render_copy_statement(mapping: &TableMapping, columns: &[String]) -> String {
    let dialect = Postgres;
    let ast = Copy {
        table: TableRef::new(mapping.target_schema.clone(), mapping.target_table.clone()),
        columns: columns.to_vec(),
        options: vec![CopyOption::new("FORMAT", Some("csv"))],
    };
    let mut renderer = Renderer::new(&dialect);
    ast.render(&mut renderer);
    let (sql, _params) = renderer.finish();
    sql
}

#[async_trait]
impl super::ShardWriter for CopyWriter {
    async fn write_rows(&mut self, rows: &[Vec<FieldPresence>]) -> Result<WriteOutcome, WriterError> {
        if rows.is_empty() {
            return Ok(WriteOutcome::default());
        }

        if !self.began {
            self.conn.begin(&self.isolation_level).await?;
            self.began = true;
        }

        let lines = rows.iter().map(|row| {
            let mut line = String::new();
            for (i, field) in row.iter().enumerate() {
                if i > 0 {
                    line.push(self.delimiter);
                }
                line.push_str(&self.encoder.encode_field(field));
            }
            line.push('\n');
            line
        });

        let rows_written = self.conn.copy_chunk(&self.statement, lines).await?;

        if self.auto_commit {
            self.conn.commit().await?;
            self.began = false;
        }

        Ok(WriteOutcome {
            rows_written,
            rows_skipped: 0,
        })
    }

    /// Commits the shard's transaction. A shard with no rows, or one running
    /// with `auto_commit`, never leaves a transaction open here.
    async fn finish(&mut self) -> Result<(), WriterError> {
        if self.began {
            self.conn.commit().await?;
            self.began = false;
        }
        Ok(())
    }
}
