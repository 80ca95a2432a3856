use model::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Value(Value),
    Literal(String),
}

#[derive(Debug, Clone)]
pub struct CopyOption {
    pub key: String,
    pub value: Option<String>,
}

impl CopyOption {
    pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            key: key.into(),
            value: value.map(|v| v.to_string()),
        }
    }
}

/// `COPY <table> (<columns>) FROM STDIN WITH (<options>)`.
#[derive(Debug, Clone)]
pub struct Copy {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub options: Vec<CopyOption>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
    pub on_conflict: Option<OnConflict>,
}

#[derive(Debug, Clone)]
pub struct OnConflict {
    pub columns: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
}
