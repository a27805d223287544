//! # tagstore
//!
//! A tagged, compressed key-value storage layer backed by Redis.
//!
//! ## Features
//!
//! - **Key-value contract:** `get`/`add`/`delete` over opaque string values
//! - **Tag index:** group many keys under shared tags, retrieve or
//!   invalidate whole groups at once
//! - **Self-describing compression:** payloads above a configurable
//!   threshold are compressed and prefixed with a 4-byte envelope naming
//!   the codec, so the algorithm can change without a data migration
//! - **Explicit lifecycle:** one validated connection per manager, with a
//!   liveness probe and an explicit close
//! - **Backend seam:** the transport is a trait; an in-memory transport
//!   backs tests and local development
//!
//! ## Quick Start
//!
//! ```ignore
//! use tagstore::{ConnectionManager, ConnectionSettings, KeyValueStorage, TaggedStore};
//!
//! // Connects once; an unreachable server fails construction
//! let manager = ConnectionManager::connect(ConnectionSettings::default()).await?;
//! let mut store = TaggedStore::new(manager);
//!
//! store.set("sku:42", "blue widget", &["widgets", "blue"]).await?;
//! let widgets = store.get_by_tag("widgets").await?;
//!
//! store.manager_mut().close().await;
//! ```

#[macro_use]
extern crate log;

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use codec::CompressionAlgorithm;
pub use config::{ConnectionConfig, ConnectionSettings};
pub use connection::ConnectionManager;
pub use error::{Error, Result};
pub use store::{KeyValueStorage, TaggedStore};
pub use transport::StoreTransport;

#[cfg(feature = "inmemory")]
pub use transport::InMemoryTransport;
#[cfg(feature = "redis")]
pub use transport::RedisTransport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
