pub mod error;
pub mod mongo;
pub mod postgres;

pub use error::{classify_mongo_error, classify_postgres_error, ConnectorError, ErrorClass};
pub use postgres::PgConnection;
