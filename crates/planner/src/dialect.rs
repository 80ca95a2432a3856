//! SQL-rendering seam. Kept as a trait, with a single implementation, because
//! the rest of this crate (the AST + renderer split) is written against the
//! trait rather than against PostgreSQL literal syntax directly.

use model::DataType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier in the quoting the dialect expects.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Placeholder for the `index`-th bound parameter (0-based).
    fn get_placeholder(&self, index: usize) -> String;

    fn render_data_type(&self, data_type: DataType) -> String;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{ident}""#)
    }

    fn get_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn render_data_type(&self, data_type: DataType) -> String {
        data_type.postgres_name().to_string()
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_with_double_quotes() {
        let d = Postgres;
        assert_eq!(d.quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn placeholders_are_one_indexed() {
        let d = Postgres;
        assert_eq!(d.get_placeholder(0), "$1");
        assert_eq!(d.get_placeholder(3), "$4");
    }
}
