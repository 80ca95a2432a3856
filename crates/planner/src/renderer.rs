use crate::ast::{ConflictAction, Copy, Expr, Insert, TableRef};
use crate::dialect::Dialect;
use model::Value;

pub trait Render {
    fn render(&self, r: &mut Renderer);
}

/// Accumulates SQL text and bound parameters while an AST node renders.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn render_table_ref(&mut self, table: &TableRef) {
        if let Some(schema) = &table.schema {
            self.sql.push_str(&self.dialect.quote_identifier(schema));
            self.sql.push('.');
        }
        self.sql.push_str(&self.dialect.quote_identifier(&table.name));
    }

    fn add_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.get_placeholder(self.params.len() - 1);
        self.sql.push_str(&placeholder);
    }
}

impl Render for Expr {
    fn render(&self, r: &mut Renderer) {
        match self {
            Expr::Value(v) => r.add_param(v.clone()),
            Expr::Literal(s) => r.sql.push_str(s),
        }
    }
}

impl Render for Copy {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("COPY ");
        r.render_table_ref(&self.table);

        if !self.columns.is_empty() {
            r.sql.push_str(" (");
            let cols: Vec<String> = self
                .columns
                .iter()
                .map(|c| r.dialect.quote_identifier(c))
                .collect();
            r.sql.push_str(&cols.join(", "));
            r.sql.push(')');
        }

        r.sql.push_str(" FROM STDIN");

        if !self.options.is_empty() {
            r.sql.push_str(" WITH (");
            for (i, option) in self.options.iter().enumerate() {
                if i > 0 {
                    r.sql.push_str(", ");
                }
                r.sql.push_str(&option.key);
                if let Some(value) = &option.value {
                    r.sql.push(' ');
                    r.sql.push_str(value);
                }
            }
            r.sql.push(')');
        }
    }
}

impl Render for Insert {
    fn render(&self, r: &mut Renderer) {
        r.sql.push_str("INSERT INTO ");
        r.render_table_ref(&self.table);
        r.sql.push_str(" (");
        let quoted: Vec<String> = self
            .columns
            .iter()
            .map(|c| r.dialect.quote_identifier(c))
            .collect();
        r.sql.push_str(&quoted.join(", "));
        r.sql.push(')');

        r.sql.push_str(" VALUES ");
        for (i, row) in self.values.iter().enumerate() {
            if i > 0 {
                r.sql.push_str(", ");
            }
            r.sql.push('(');
            for (j, val) in row.iter().enumerate() {
                if j > 0 {
                    r.sql.push_str(", ");
                }
                val.render(r);
            }
            r.sql.push(')');
        }

        if let Some(on_conflict) = &self.on_conflict {
            r.sql.push_str(" ON CONFLICT (");
            let quoted: Vec<String> = on_conflict
                .columns
                .iter()
                .map(|c| r.dialect.quote_identifier(c))
                .collect();
            r.sql.push_str(&quoted.join(", "));
            r.sql.push(')');
            match on_conflict.action {
                ConflictAction::DoNothing => r.sql.push_str(" DO NOTHING"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CopyOption, OnConflict};
    use crate::dialect::Postgres;

    #[test]
    fn renders_copy_from_stdin() {
        let copy = Copy {
            table: TableRef::new("public", "docs"),
            columns: vec!["id".to_string(), "payload".to_string()],
            options: vec![CopyOption::new("FORMAT", Some("csv"))],
        };
        let dialect = Postgres;
        let mut r = Renderer::new(&dialect);
        copy.render(&mut r);
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"COPY "public"."docs" ("id", "payload") FROM STDIN WITH (FORMAT csv)"#
        );
        assert!(params.is_empty());
    }

    #[test]
    fn renders_batch_insert_with_on_conflict() {
        let insert = Insert {
            table: TableRef::new("public", "docs"),
            columns: vec!["id".to_string(), "name".to_string()],
            values: vec![
                vec![
                    Expr::Value(Value::Int(1)),
                    Expr::Value(Value::String("a".into())),
                ],
                vec![
                    Expr::Value(Value::Int(2)),
                    Expr::Value(Value::String("b".into())),
                ],
            ],
            on_conflict: Some(OnConflict {
                columns: vec!["id".to_string()],
                action: ConflictAction::DoNothing,
            }),
        };
        let dialect = Postgres;
        let mut r = Renderer::new(&dialect);
        insert.render(&mut r);
        let (sql, params) = r.finish();
        assert_eq!(
            sql,
            r#"INSERT INTO "public"."docs" ("id", "name") VALUES ($1, $2), ($3, $4) ON CONFLICT ("id") DO NOTHING"#
        );
        assert_eq!(params.len(), 4);
    }
}
