use crate::error::ConnectorError;
use crate::postgres::params::PgParamStore;
use bytes::Bytes;
use futures_util::{SinkExt, pin_mut};
use model::Value;
use tokio_postgres::Client;
use tracing::{error, warn};

/// One authenticated session to the target store. Single-use by contract
/// (§4.2): bulk-copy and batch-insert writers each own their connection for
/// the lifetime of a shard, there is no pooling underneath.
pub struct PgConnection {
    client: Client,
}

impl PgConnection {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn exec(&self, sql: &str) -> Result<(), ConnectorError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    pub async fn exec_params(&self, sql: &str, params: Vec<Value>) -> Result<u64, ConnectorError> {
        let store = PgParamStore::from_values(params);
        let refs = store.as_refs();
        Ok(self.client.execute(sql, &refs).await?)
    }

    pub async fn query(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Vec<tokio_postgres::Row>, ConnectorError> {
        let store = PgParamStore::from_values(params);
        let refs = store.as_refs();
        Ok(self.client.query(sql, &refs).await?)
    }

    pub async fn query_opt(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Option<tokio_postgres::Row>, ConnectorError> {
        let store = PgParamStore::from_values(params);
        let refs = store.as_refs();
        Ok(self.client.query_opt(sql, &refs).await?)
    }

    pub async fn truncate_table(&self, qualified_table: &str) -> Result<(), ConnectorError> {
        self.client
            .batch_execute(&format!("TRUNCATE TABLE {qualified_table}"))
            .await?;
        Ok(())
    }

    /// Opens a transaction block with a raw `BEGIN`. Unlike
    /// `Client::transaction`, this doesn't hand back a `Transaction<'_>`
    /// borrowing the client, so the caller can keep issuing independent
    /// `copy_chunk` calls across `.await` points (and struct field
    /// boundaries) without a self-referential borrow.
    ///
    /// `isolation_level` is sent as `SET TRANSACTION ISOLATION LEVEL` in the
    /// same simple-query batch as the `BEGIN`, so it applies to this
    /// transaction only. Unrecognized values are logged and left at the
    /// session default rather than sent to the server as literal SQL.
    pub async fn begin(&self, isolation_level: &str) -> Result<(), ConnectorError> {
        match normalize_isolation_level(isolation_level) {
            Some(level) => {
                self.client
                    .batch_execute(&format!("BEGIN; SET TRANSACTION ISOLATION LEVEL {level}"))
                    .await?;
            }
            None => {
                warn!(isolation_level, "unrecognized isolation level, using session default");
                self.client.batch_execute("BEGIN").await?;
            }
        }
        Ok(())
    }

    pub async fn commit(&self) -> Result<(), ConnectorError> {
        self.client.batch_execute("COMMIT").await?;
        Ok(())
    }

    /// Streams already-encoded CSV lines into one `COPY FROM STDIN` for
    /// `statement`. Does not begin or commit anything itself: call `begin()`
    /// once before the first chunk and `commit()` once after the last, so a
    /// multi-chunk shard lands in a single transaction (§4.4).
    pub async fn copy_chunk(
        &self,
        statement: &str,
        lines: impl IntoIterator<Item = String>,
    ) -> Result<u64, ConnectorError> {
        let mut rows_written = 0u64;
        let sink = self.client.copy_in(statement).await?;
        pin_mut!(sink);
        for line in lines {
            rows_written += 1;
            sink.as_mut().send(Bytes::from(line)).await?;
        }
        sink.as_mut().close().await?;
        Ok(rows_written)
    }
}

fn normalize_isolation_level(level: &str) -> Option<&'static str> {
    match level.trim().to_ascii_uppercase().as_str() {
        "READ UNCOMMITTED" => Some("READ UNCOMMITTED"),
        "READ COMMITTED" => Some("READ COMMITTED"),
        "REPEATABLE READ" => Some("REPEATABLE READ"),
        "SERIALIZABLE" => Some("SERIALIZABLE"),
        _ => None,
    }
}

pub(crate) async fn connect(url: &str) -> Result<Client, ConnectorError> {
    use native_tls::TlsConnector;
    use postgres_native_tls::MakeTlsConnector;
    use tokio_postgres::{Config, NoTls, config::SslMode};

    let config: Config = url
        .parse()
        .map_err(|e: tokio_postgres::Error| ConnectorError::Postgres(e))?;

    match config.get_ssl_mode() {
        SslMode::Disable => connect_plain(config).await,
        SslMode::Prefer => {
            let connector = TlsConnector::builder().build()?;
            let tls = MakeTlsConnector::new(connector);
            match config.clone().connect(tls).await {
                Ok((client, connection)) => {
                    spawn_connection(connection);
                    Ok(client)
                }
                Err(_) => connect_plain(config).await,
            }
        }
        _ => {
            let connector = TlsConnector::builder().build()?;
            let tls = MakeTlsConnector::new(connector);
            let (client, connection) = config.connect(tls).await?;
            spawn_connection(connection);
            Ok(client)
        }
    }
}

async fn connect_plain(config: tokio_postgres::Config) -> Result<Client, ConnectorError> {
    let (client, connection) = config.connect(tokio_postgres::NoTls).await?;
    spawn_connection(connection);
    Ok(client)
}

fn spawn_connection<S, T>(connection: tokio_postgres::Connection<S, T>)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    T: tokio_postgres::tls::TlsStream + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "postgres connection terminated");
        }
    });
}
