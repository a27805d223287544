//! Redis transport implementation.

use super::StoreTransport;
use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use redis::aio::MultiplexedConnection;
use std::time::Duration;

/// Transport over a single logical Redis connection.
///
/// The session is established by the first [`ping`](StoreTransport::ping)
/// and dropped by [`close`](StoreTransport::close); a later `ping`
/// re-establishes it. Connect attempts are bounded by the configured
/// timeout. Log lines only ever carry the credential-free endpoint.
pub struct RedisTransport {
    client: redis::Client,
    connection: Option<MultiplexedConnection>,
    timeout: Duration,
    endpoint: String,
}

impl RedisTransport {
    /// Build a transport from resolved configuration. Does not connect;
    /// the session is established by the first `ping`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the parameters do not form a valid
    /// Redis target.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let auth = match &config.password {
            Some(password) => format!(":{}@", password),
            None => String::new(),
        };
        let url = format!(
            "redis://{}{}:{}/{}",
            auth, config.host, config.port, config.database
        );

        let client = redis::Client::open(url)
            .map_err(|e| Error::ConfigError(format!("Invalid Redis parameters: {}", e)))?;

        Ok(RedisTransport {
            client,
            connection: None,
            timeout: config.timeout,
            endpoint: config.endpoint(),
        })
    }

    async fn connection(&mut self) -> Result<&mut MultiplexedConnection> {
        if self.connection.is_none() {
            let connect = self.client.get_multiplexed_async_connection();
            let connection = tokio::time::timeout(self.timeout, connect)
                .await
                .map_err(|_| {
                    Error::TransportError(format!("Connect to {} timed out", self.endpoint))
                })?
                .map_err(|e| {
                    Error::TransportError(format!("Connect to {} failed: {}", self.endpoint, e))
                })?;
            debug!("Connected to {}", self.endpoint);
            self.connection = Some(connection);
        }

        self.connection
            .as_mut()
            .ok_or_else(|| Error::TransportError(format!("No connection to {}", self.endpoint)))
    }
}

impl StoreTransport for RedisTransport {
    async fn ping(&mut self) -> Result<()> {
        let connection = self.connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis PING failed: {}", e)))?;

        if pong == "PONG" {
            Ok(())
        } else {
            Err(Error::TransportError(format!(
                "Unexpected PING reply: {}",
                pong
            )))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.connection.take().is_some() {
            debug!("Closed connection to {}", self.endpoint);
        }
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let connection = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis GET failed for {}: {}", key, e)))
    }

    async fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let connection = self.connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis SET failed for {}: {}", key, e)))
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        let connection = self.connection().await?;
        redis::cmd("EXISTS")
            .arg(key)
            .query_async(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis EXISTS failed for {}: {}", key, e)))
    }

    async fn del(&mut self, key: &str) -> Result<bool> {
        let connection = self.connection().await?;
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis DEL failed for {}: {}", key, e)))?;
        Ok(removed > 0)
    }

    async fn hash_set(&mut self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        let connection = self.connection().await?;
        redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async::<()>(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis HSET failed for {}: {}", key, e)))
    }

    async fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let connection = self.connection().await?;
        redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis HGET failed for {}: {}", key, e)))
    }

    async fn set_add(&mut self, set: &str, member: &str) -> Result<()> {
        let connection = self.connection().await?;
        redis::cmd("SADD")
            .arg(set)
            .arg(member)
            .query_async::<()>(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis SADD failed for {}: {}", set, e)))
    }

    async fn set_remove(&mut self, set: &str, member: &str) -> Result<()> {
        let connection = self.connection().await?;
        redis::cmd("SREM")
            .arg(set)
            .arg(member)
            .query_async::<()>(connection)
            .await
            .map_err(|e| Error::TransportError(format!("Redis SREM failed for {}: {}", set, e)))
    }

    async fn set_members(&mut self, set: &str) -> Result<Vec<String>> {
        let connection = self.connection().await?;
        redis::cmd("SMEMBERS")
            .arg(set)
            .query_async(connection)
            .await
            .map_err(|e| {
                Error::TransportError(format!("Redis SMEMBERS failed for {}: {}", set, e))
            })
    }
}

// Integration tests require a running Redis instance; each test skips
// itself when the server is unreachable.
#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ConnectionConfig {
        ConnectionConfig {
            host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            ..Default::default()
        }
    }

    async fn connected_transport() -> Option<RedisTransport> {
        let mut transport = RedisTransport::new(&test_config()).expect("Failed to build client");
        match transport.ping().await {
            Ok(()) => Some(transport),
            Err(e) => {
                warn!("Skipping Redis test (server not available): {}", e);
                None
            }
        }
    }

    #[test]
    fn test_new_does_not_connect() {
        let config = ConnectionConfig {
            host: "host.invalid".to_string(),
            ..Default::default()
        };
        // Building the client must succeed even for an unreachable host
        let transport = RedisTransport::new(&config).expect("Failed to build client");
        assert!(transport.connection.is_none());
    }

    #[tokio::test]
    async fn test_plain_key_roundtrip() {
        let Some(mut transport) = connected_transport().await else {
            return;
        };

        let key = format!("tagstore:test:{}", std::process::id());
        transport.set(&key, b"v".to_vec()).await.expect("set");
        assert_eq!(
            transport.get(&key).await.expect("get"),
            Some(b"v".to_vec())
        );
        assert!(transport.del(&key).await.expect("del"));
        assert!(transport.get(&key).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_close_then_ping_reconnects() {
        let Some(mut transport) = connected_transport().await else {
            return;
        };

        transport.close().await.expect("close");
        assert!(transport.connection.is_none());
        transport.ping().await.expect("ping after close");
        assert!(transport.connection.is_some());
    }
}
