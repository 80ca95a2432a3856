pub mod connection;
pub mod encoder;
pub mod factory;
pub mod params;

pub use connection::PgConnection;
pub use encoder::{CsvEncoder, CsvOptions};
pub use factory::{ConnectionFactory, ConnectionFactoryConfig};
