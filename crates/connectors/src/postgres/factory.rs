use crate::error::ConnectorError;
use crate::postgres::connection::{connect, PgConnection};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Target-store session options, one factory per run (§4.2). `connect()`
/// returns a fresh, single-use session; nothing here is pooled.
#[derive(Debug, Clone)]
pub struct ConnectionFactoryConfig {
    pub hosts: Vec<String>,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub load_balance_hosts: bool,
    pub tcp_keepalive: bool,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
}

pub struct ConnectionFactory {
    config: ConnectionFactoryConfig,
    cursor: AtomicUsize,
}

impl ConnectionFactory {
    pub fn new(config: ConnectionFactoryConfig) -> Result<Self, ConnectorError> {
        if config.hosts.is_empty() {
            return Err(ConnectorError::NoHosts);
        }
        Ok(Self {
            config,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Picks the next host (round-robin when `load_balance_hosts` and more
    /// than one host are configured, otherwise always the first) and opens a
    /// new, single-use session against it.
    pub async fn connect(&self) -> Result<PgConnection, ConnectorError> {
        let host = self.next_host();
        let url = self.build_url(&host);
        let client = connect(&url).await?;
        Ok(PgConnection::new(client))
    }

    fn next_host(&self) -> String {
        if !self.config.load_balance_hosts || self.config.hosts.len() == 1 {
            return self.config.hosts[0].clone();
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.config.hosts.len();
        self.config.hosts[idx].clone()
    }

    fn build_url(&self, host: &str) -> String {
        let mut url = format!(
            "postgresql://{}:{}@{}:{}/{}",
            urlencode(&self.config.username),
            urlencode(&self.config.password),
            host,
            self.config.port,
            self.config.database,
        );
        let mut params = Vec::new();
        if self.config.connect_timeout.as_secs() > 0 {
            params.push(format!("connect_timeout={}", self.config.connect_timeout.as_secs()));
        }
        if self.config.tcp_keepalive {
            params.push("keepalives=1".to_string());
        }
        if !params.is_empty() {
            url.push('?');
            url.push_str(&params.join("&"));
        }
        url
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => c.to_string(),
            other => format!("%{:02X}", other as u32),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(hosts: Vec<&str>) -> ConnectionFactoryConfig {
        ConnectionFactoryConfig {
            hosts: hosts.into_iter().map(String::from).collect(),
            port: 5433,
            database: "db".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            load_balance_hosts: true,
            tcp_keepalive: true,
            connect_timeout: Duration::from_secs(5),
            socket_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn rejects_empty_host_list() {
        let result = ConnectionFactory::new(config(vec![]));
        assert!(result.is_err());
    }

    #[test]
    fn round_robins_across_hosts() {
        let factory = ConnectionFactory::new(config(vec!["a", "b", "c"])).unwrap();
        let seq: Vec<String> = (0..4).map(|_| factory.next_host()).collect();
        assert_eq!(seq, vec!["a", "b", "c", "a"]);
    }
}
