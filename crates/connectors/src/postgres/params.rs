use model::Value;
use tokio_postgres::types::{Json as PgJson, ToSql};

pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => PgParam(Box::new(Option::<String>::None)),
            Value::Boolean(v) => PgParam(Box::new(v)),
            Value::Int(v) => PgParam(Box::new(v)),
            Value::Float(v) => PgParam(Box::new(v)),
            Value::String(v) => PgParam(Box::new(v)),
            Value::Json(v) => PgParam(Box::new(PgJson(v))),
            Value::Uuid(v) => PgParam(Box::new(v)),
            Value::Bytes(v) => PgParam(Box::new(v)),
            Value::Timestamp(v) => PgParam(Box::new(v)),
            Value::Date(v) => PgParam(Box::new(v)),
        }
    }
}

impl PgParam {
    pub fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            params: values.into_iter().map(PgParam::from_value).collect(),
        }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}
