//! Transport abstraction over the backing store.

use crate::error::Result;

#[cfg(feature = "inmemory")]
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use memory::InMemoryTransport;
#[cfg(feature = "redis")]
pub use self::redis::RedisTransport;

/// Capability set required of the backing transport.
///
/// One transport instance belongs to one logical worker at a time; the
/// `&mut self` receivers make that explicit. Callers that need concurrency
/// create a transport per worker. Implementations translate their protocol
/// errors into [`crate::Error::TransportError`].
#[allow(async_fn_in_trait)]
pub trait StoreTransport {
    /// Establish the session if needed and verify liveness.
    async fn ping(&mut self) -> Result<()>;

    /// Release the session. Releasing an already-closed session is a no-op;
    /// a later [`ping`](StoreTransport::ping) re-establishes it.
    async fn close(&mut self) -> Result<()>;

    /// Fetch the plain value stored under `key`.
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` as a plain key.
    async fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Whether any record exists under `key`.
    async fn exists(&mut self, key: &str) -> Result<bool>;

    /// Remove the record under `key`; returns whether anything was removed.
    async fn del(&mut self, key: &str) -> Result<bool>;

    /// Store `value` under a named field of the record at `key`.
    async fn hash_set(&mut self, key: &str, field: &str, value: Vec<u8>) -> Result<()>;

    /// Fetch a named field of the record at `key`.
    async fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    /// Add `member` to the unordered set at `set`.
    async fn set_add(&mut self, set: &str, member: &str) -> Result<()>;

    /// Remove `member` from the unordered set at `set`.
    async fn set_remove(&mut self, set: &str, member: &str) -> Result<()>;

    /// All members of the unordered set at `set`; iteration order is
    /// unspecified.
    async fn set_members(&mut self, set: &str) -> Result<Vec<String>>;
}
