use chrono::{DateTime, NaiveDate, Utc};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A single transformed column value, already coerced to a Postgres-representable type.
///
/// Variants intentionally mirror the scalar types Yugabyte/Postgres can bind directly
/// (no dual-dialect numeric zoo); anything wider is carried as `Json`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn data_type(&self) -> super::data_type::DataType {
        use super::data_type::DataType;
        match self {
            Value::Null => DataType::Text,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int(_) => DataType::BigInt,
            Value::Float(_) => DataType::DoublePrecision,
            Value::String(_) => DataType::Text,
            Value::Json(_) => DataType::Jsonb,
            Value::Uuid(_) => DataType::Uuid,
            Value::Bytes(_) => DataType::Bytea,
            Value::Timestamp(_) => DataType::TimestampTz,
            Value::Date(_) => DataType::Date,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

// Hash must agree with PartialEq even across the float bit-pattern quirks
// (NaN, -0.0) that derive(Hash) gets wrong for f64.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Json(j) => j.to_string().hash(state),
            Value::Uuid(u) => u.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_distinct_from_empty_string() {
        assert_ne!(Value::Null, Value::String(String::new()));
    }

    #[test]
    fn nan_floats_hash_consistently() {
        let a = Value::Float(f64::NAN);
        let b = Value::Float(f64::NAN);
        assert_eq!(a, b);
    }
}
