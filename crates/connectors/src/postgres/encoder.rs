use chrono::SecondsFormat;
use model::{FieldPresence, Value};

/// CSV framing options for the COPY writer (§4.4). All four are independently
/// configurable; defaults match PostgreSQL's own `COPY ... WITH (FORMAT csv)`.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: char,
    pub null: String,
    pub quote: char,
    pub escape: char,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            null: String::new(),
            quote: '"',
            escape: '"',
        }
    }
}

pub struct CsvEncoder {
    opts: CsvOptions,
}

impl CsvEncoder {
    pub fn new(opts: CsvOptions) -> Self {
        Self { opts }
    }

    /// Encodes one field per the escaping contract: null and missing both
    /// collapse to the bare `csvNull` token; everything else is quoted only
    /// when it must be to stay distinguishable or round-trip safely.
    pub fn encode_field(&self, field: &FieldPresence) -> String {
        match field {
            FieldPresence::Missing | FieldPresence::Null => self.opts.null.clone(),
            FieldPresence::Present(value) => self.encode_value(value),
        }
    }

    fn encode_value(&self, value: &Value) -> String {
        let raw = match value {
            Value::Null => return self.opts.null.clone(),
            Value::String(s) => s.clone(),
            Value::Json(v) => v.to_string(),
            Value::Bytes(bytes) => encode_bytea(bytes),
            Value::Boolean(v) => return v.to_string(),
            Value::Int(v) => return v.to_string(),
            Value::Float(v) => return ryu::Buffer::new().format(*v).to_string(),
            Value::Uuid(v) => v.to_string(),
            Value::Date(d) => d.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        self.quote_if_needed(&raw)
    }

    fn quote_if_needed(&self, raw: &str) -> String {
        if raw.is_empty() {
            return self.wrap(raw);
        }
        let needs_quoting = raw.is_empty()
            || raw.chars().all(|c| c.is_whitespace())
            || raw
                .chars()
                .any(|c| c == self.opts.delimiter || c == self.opts.quote || c == '\n' || c == '\r')
            || raw.chars().any(|c| !c.is_ascii());

        if needs_quoting {
            self.wrap(raw)
        } else {
            raw.to_string()
        }
    }

    fn wrap(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() + 2);
        out.push(self.opts.quote);
        for ch in raw.chars() {
            if ch == self.opts.quote {
                out.push(self.opts.escape);
            }
            out.push(ch);
        }
        out.push(self.opts.quote);
        out
    }
}

fn encode_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> CsvEncoder {
        CsvEncoder::new(CsvOptions::default())
    }

    #[test]
    fn null_is_bare_empty_string() {
        assert_eq!(encoder().encode_field(&FieldPresence::Null), "");
        assert_eq!(encoder().encode_field(&FieldPresence::Missing), "");
    }

    #[test]
    fn empty_string_is_quoted_to_distinguish_from_null() {
        let encoded = encoder().encode_field(&FieldPresence::Present(Value::String(String::new())));
        assert_eq!(encoded, "\"\"");
    }

    #[test]
    fn whitespace_only_is_quoted() {
        let encoded =
            encoder().encode_field(&FieldPresence::Present(Value::String("   ".to_string())));
        assert_eq!(encoded, "\"   \"");
    }

    #[test]
    fn delimiter_triggers_quoting() {
        let encoded =
            encoder().encode_field(&FieldPresence::Present(Value::String("a,b".to_string())));
        assert_eq!(encoded, "\"a,b\"");
    }

    #[test]
    fn embedded_quote_is_doubled() {
        let encoded =
            encoder().encode_field(&FieldPresence::Present(Value::String("a\"b".to_string())));
        assert_eq!(encoded, "\"a\"\"b\"");
    }

    #[test]
    fn non_ascii_triggers_quoting() {
        let encoded =
            encoder().encode_field(&FieldPresence::Present(Value::String("café".to_string())));
        assert_eq!(encoded, "\"café\"");
    }

    #[test]
    fn plain_ascii_value_is_unquoted() {
        let encoded =
            encoder().encode_field(&FieldPresence::Present(Value::String("hello".to_string())));
        assert_eq!(encoded, "hello");
    }
}
