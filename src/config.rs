//! Connection and tuning parameters with layered resolution.
//!
//! Settings are read from the `key_value_storage/redis` node of a
//! configuration tree, merged across two layers (deployment settings win
//! over store-scoped settings), and resolved against documented defaults in
//! a separate step. The resolved configuration is passed explicitly into
//! the connection manager; nothing is read from ambient global state.

use crate::codec::CompressionAlgorithm;
use crate::error::{Error, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Default connection timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

/// Default host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port.
pub const DEFAULT_PORT: u16 = 6379;

/// Default logical database.
pub const DEFAULT_DATABASE: i64 = 0;

/// Default compression threshold in bytes.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 2048;

/// Default compression algorithm.
pub const DEFAULT_COMPRESSION_ALGORITHM: CompressionAlgorithm = CompressionAlgorithm::Gzip;

/// Default ceiling on simultaneous lock-holders per logical resource.
pub const DEFAULT_MAX_CONCURRENCY: u32 = 6;

/// Default log level. The `log` facade has no alert severity; `Error` is
/// its most severe level.
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Error;

/// Configuration node holding the storage settings.
pub const STORAGE_NODE: &str = "key_value_storage";

/// Configuration node holding the connection settings under
/// [`STORAGE_NODE`].
pub const CONNECTION_NODE: &str = "redis";

/// Raw, unresolved settings as read from a configuration source.
///
/// Every field is optional; [`ConnectionSettings::resolve`] applies the
/// documented defaults and validates spellings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionSettings {
    pub log_level: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    /// Connect timeout in seconds; fractional values allowed.
    pub timeout: Option<f64>,
    pub persistent_identifier: Option<String>,
    pub database: Option<i64>,
    pub compression_threshold: Option<usize>,
    pub compression_library: Option<String>,
    pub max_concurrency: Option<u32>,
}

impl ConnectionSettings {
    /// Read settings from the `key_value_storage/redis` node of a
    /// configuration tree. A missing node yields empty settings.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the node exists but does not
    /// deserialize.
    pub fn from_source(source: &serde_json::Value) -> Result<Self> {
        let pointer = format!("/{}/{}", STORAGE_NODE, CONNECTION_NODE);
        match source.pointer(&pointer) {
            Some(node) => serde_json::from_value(node.clone()).map_err(|e| {
                Error::ConfigError(format!("Malformed {} settings: {}", pointer, e))
            }),
            None => Ok(ConnectionSettings::default()),
        }
    }

    /// Merge two layers field-wise; fields set on `self` win over `base`.
    pub fn overlay(self, base: Self) -> Self {
        ConnectionSettings {
            log_level: self.log_level.or(base.log_level),
            host: self.host.or(base.host),
            port: self.port.or(base.port),
            password: self.password.or(base.password),
            timeout: self.timeout.or(base.timeout),
            persistent_identifier: self.persistent_identifier.or(base.persistent_identifier),
            database: self.database.or(base.database),
            compression_threshold: self.compression_threshold.or(base.compression_threshold),
            compression_library: self.compression_library.or(base.compression_library),
            max_concurrency: self.max_concurrency.or(base.max_concurrency),
        }
    }

    /// Read and merge the deployment and store-scoped layers; deployment
    /// settings override store-scoped settings where both exist.
    pub fn layered(
        deployment: &serde_json::Value,
        store_scope: &serde_json::Value,
    ) -> Result<Self> {
        Ok(Self::from_source(deployment)?.overlay(Self::from_source(store_scope)?))
    }

    /// Apply defaults and produce a resolved configuration.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for an unknown compression algorithm or
    /// log level, a non-positive timeout, or a zero max-concurrency.
    pub fn resolve(self) -> Result<ConnectionConfig> {
        let log_level = match self.log_level {
            Some(s) => LevelFilter::from_str(&s)
                .map_err(|_| Error::ConfigError(format!("Unknown log level: {}", s)))?,
            None => DEFAULT_LOG_LEVEL,
        };

        let compression_algorithm = match self.compression_library {
            Some(s) => s.parse::<CompressionAlgorithm>()?,
            None => DEFAULT_COMPRESSION_ALGORITHM,
        };

        let timeout = match self.timeout {
            Some(secs) if secs > 0.0 => Duration::from_secs_f64(secs),
            Some(secs) => {
                return Err(Error::ConfigError(format!("Invalid timeout: {}", secs)))
            }
            None => DEFAULT_TIMEOUT,
        };

        let max_concurrency = self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            return Err(Error::ConfigError(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(ConnectionConfig {
            log_level,
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            password: self.password,
            timeout,
            persistent_identifier: self.persistent_identifier,
            database: self.database.unwrap_or(DEFAULT_DATABASE),
            compression_threshold: self
                .compression_threshold
                .unwrap_or(DEFAULT_COMPRESSION_THRESHOLD),
            compression_algorithm,
            max_concurrency,
        })
    }
}

/// Fully-resolved connection and tuning parameters.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub log_level: LevelFilter,
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub timeout: Duration,
    /// Identifier for a persistent session, carried for diagnostics.
    pub persistent_identifier: Option<String>,
    pub database: i64,
    /// Payloads of at least this many bytes are compressed; zero disables
    /// compression.
    pub compression_threshold: usize,
    pub compression_algorithm: CompressionAlgorithm,
    /// Ceiling on simultaneous lock-holders per logical resource; enforced
    /// by the backing store's locking primitives, not by this crate.
    pub max_concurrency: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            log_level: DEFAULT_LOG_LEVEL,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            timeout: DEFAULT_TIMEOUT,
            persistent_identifier: None,
            database: DEFAULT_DATABASE,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            compression_algorithm: DEFAULT_COMPRESSION_ALGORITHM,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ConnectionConfig {
    /// Endpoint string for diagnostics. Never includes credentials.
    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}
