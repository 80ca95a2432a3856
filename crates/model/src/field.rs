use crate::{DataType, Value};

/// Whether a source field was absent, present-but-null, or present with a value.
///
/// `Option<Value>` alone can't carry this: both "absent" and "null" would
/// collapse to `None`, but the writer contract (see the bulk-copy encoding
/// table) requires them to stay distinguishable all the way to the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPresence {
    Missing,
    Null,
    Present(Value),
}

impl FieldPresence {
    pub fn into_value(self) -> Value {
        match self {
            FieldPresence::Missing | FieldPresence::Null => Value::Null,
            FieldPresence::Present(v) => v,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldPresence::Missing)
    }
}

#[derive(Debug, Clone)]
pub struct FieldValue {
    pub name: String,
    pub presence: FieldPresence,
    pub data_type: DataType,
}

impl FieldValue {
    pub fn new(name: impl Into<String>, presence: FieldPresence, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            presence,
            data_type,
        }
    }
}
