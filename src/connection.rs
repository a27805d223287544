//! Connection lifecycle management.

use crate::config::ConnectionConfig;
#[cfg(feature = "redis")]
use crate::config::ConnectionSettings;
use crate::error::{Error, Result};
use crate::transport::StoreTransport;
use std::time::Instant;

#[cfg(feature = "redis")]
use crate::transport::RedisTransport;

/// Owns the lifecycle of one logical connection to the backing store.
///
/// Construction performs exactly one connection attempt; a failure is fatal
/// and surfaces as [`Error::ConnectionFailed`] with no internal retry. The
/// connection is never closed implicitly: destruction order among
/// cooperating objects at process teardown is unpredictable, so callers
/// invoke [`close`](ConnectionManager::close) explicitly.
///
/// Every lifecycle log line carries a `<hostname>|<pid>` identity token so
/// logs from cooperating processes can be correlated.
pub struct ConnectionManager<T> {
    transport: T,
    config: ConnectionConfig,
    identity: String,
}

#[cfg(feature = "redis")]
impl ConnectionManager<RedisTransport> {
    /// Resolve `settings`, build the Redis transport and connect.
    ///
    /// # Errors
    /// - `Error::ConfigError` if the settings do not resolve
    /// - `Error::ConnectionFailed` if the single connection attempt fails
    pub async fn connect(settings: ConnectionSettings) -> Result<Self> {
        let config = settings.resolve()?;
        let transport = RedisTransport::new(&config)?;
        Self::with_transport(transport, config).await
    }
}

impl<T: StoreTransport> ConnectionManager<T> {
    /// Validate `transport` with one connection attempt and wrap it.
    ///
    /// # Errors
    /// Returns `Error::ConnectionFailed` if the attempt fails.
    pub async fn with_transport(transport: T, config: ConnectionConfig) -> Result<Self> {
        let started = Instant::now();
        let mut manager = ConnectionManager {
            transport,
            config,
            identity: process_identity(),
        };

        if !manager.has_connection().await {
            return Err(Error::ConnectionFailed(format!(
                "Unable to connect to {}",
                manager.config.endpoint()
            )));
        }

        info!(
            "{}: ConnectionManager initialized for connection to {} after {:.5} seconds",
            manager.identity,
            manager.config.endpoint(),
            started.elapsed().as_secs_f64()
        );
        Ok(manager)
    }

    /// Live connect/ping probe.
    ///
    /// Transport errors become `false` plus a log entry, never a panic or
    /// an error: a cache is allowed to be unavailable without taking down
    /// the caller.
    pub async fn has_connection(&mut self) -> bool {
        match self.transport.ping().await {
            Ok(()) => {
                debug!(
                    "{}: Connected to {}",
                    self.identity,
                    self.config.endpoint()
                );
                true
            }
            Err(e) => {
                warn!(
                    "{}: Unable to connect to {}: {}",
                    self.identity,
                    self.config.endpoint(),
                    e
                );
                false
            }
        }
    }

    /// Close the underlying transport.
    ///
    /// Idempotent and best-effort: always returns `true`, whether or not
    /// the remote side observed the close.
    pub async fn close(&mut self) -> bool {
        debug!("{}: Closing connection", self.identity);
        if let Err(e) = self.transport.close().await {
            warn!("{}: Close failed: {}", self.identity, e);
        }
        true
    }

    /// Resolved configuration this connection was built from.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Per-process identity token used in log lines.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Stable `<hostname>|<pid>` token for cross-process log correlation.
fn process_identity() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}|{}", host, std::process::id())
}
