use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("mongo error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("bson error: {0}")]
    Bson(String),

    #[error("no hosts configured")]
    NoHosts,

    #[error("column {0} has no primary key; batch-insert requires one")]
    MissingPrimaryKey(String),

    #[error("{0}")]
    Other(String),
}

/// Whether a failed operation is worth retrying under the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Fatal,
}

/// Maps a raw tokio-postgres error to the retry disposition driven by its
/// SQLSTATE (serialization conflicts, dropped connections, resource
/// exhaustion are transient; everything else - constraint violations,
/// syntax errors, auth failures - is fatal).
pub fn classify_postgres_error(err: &tokio_postgres::Error) -> ErrorClass {
    if err.is_closed() {
        return ErrorClass::Transient;
    }

    let Some(code) = err.code() else {
        return ErrorClass::Transient;
    };

    use tokio_postgres::error::SqlState;
    const RETRYABLE: &[&SqlState] = &[
        &SqlState::T_R_SERIALIZATION_FAILURE,
        &SqlState::T_R_DEADLOCK_DETECTED,
        &SqlState::LOCK_NOT_AVAILABLE,
        &SqlState::TOO_MANY_CONNECTIONS,
        &SqlState::ADMIN_SHUTDOWN,
        &SqlState::CRASH_SHUTDOWN,
        &SqlState::CANNOT_CONNECT_NOW,
        &SqlState::CONNECTION_FAILURE,
        &SqlState::CONNECTION_DOES_NOT_EXIST,
        &SqlState::SQLCLIENT_UNABLE_TO_ESTABLISH_SQLCONNECTION,
        &SqlState::SQLSERVER_REJECTED_ESTABLISHMENT_OF_SQLCONNECTION,
        &SqlState::CONNECTION_EXCEPTION,
        &SqlState::OUT_OF_MEMORY,
    ];

    if RETRYABLE.contains(&code) {
        ErrorClass::Transient
    } else {
        ErrorClass::Fatal
    }
}

pub fn classify_mongo_error(err: &mongodb::error::Error) -> ErrorClass {
    use mongodb::error::ErrorKind;
    match err.kind.as_ref() {
        ErrorKind::Io(_) => ErrorClass::Transient,
        ErrorKind::ServerSelection { .. } => ErrorClass::Transient,
        ErrorKind::ConnectionPoolCleared { .. } => ErrorClass::Transient,
        _ if err.is_network_error() => ErrorClass::Transient,
        _ => ErrorClass::Fatal,
    }
}
