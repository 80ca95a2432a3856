use std::fmt;

/// Target-side column types. Trimmed to the subset Yugabyte's Postgres-wire
/// frontend actually speaks; there is no MySQL counterpart to carry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    DoublePrecision,
    Numeric,
    Text,
    Varchar,
    Jsonb,
    Uuid,
    Bytea,
    Date,
    Timestamp,
    TimestampTz,
}

impl DataType {
    pub fn postgres_name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::SmallInt => "smallint",
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::Real => "real",
            DataType::DoublePrecision => "double precision",
            DataType::Numeric => "numeric",
            DataType::Text => "text",
            DataType::Varchar => "varchar",
            DataType::Jsonb => "jsonb",
            DataType::Uuid => "uuid",
            DataType::Bytea => "bytea",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
            DataType::TimestampTz => "timestamptz",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.postgres_name())
    }
}

impl TryFrom<&str> for DataType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(DataType::Boolean),
            "smallint" | "int2" => Ok(DataType::SmallInt),
            "integer" | "int" | "int4" => Ok(DataType::Integer),
            "bigint" | "int8" => Ok(DataType::BigInt),
            "real" | "float4" => Ok(DataType::Real),
            "double precision" | "float8" | "double" => Ok(DataType::DoublePrecision),
            "numeric" | "decimal" => Ok(DataType::Numeric),
            "text" => Ok(DataType::Text),
            "varchar" | "character varying" => Ok(DataType::Varchar),
            "jsonb" | "json" => Ok(DataType::Jsonb),
            "uuid" => Ok(DataType::Uuid),
            "bytea" => Ok(DataType::Bytea),
            "date" => Ok(DataType::Date),
            "timestamp" => Ok(DataType::Timestamp),
            "timestamptz" | "timestamp with time zone" => Ok(DataType::TimestampTz),
            other => Err(format!("unrecognized target type: {other}")),
        }
    }
}
