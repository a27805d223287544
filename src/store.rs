//! Tagged key-value store over the transport.
//!
//! Tags are realized as backing-store sets: every tag is a set key whose
//! members are the keys carrying that tag. Retrieving a tag walks the
//! member set and fetches each member's body field; invalidating by tag is
//! a matter of walking the same set.

use crate::codec;
use crate::connection::ConnectionManager;
use crate::error::{Error, Result};
use crate::transport::StoreTransport;
use std::collections::HashMap;

/// Record field holding an entry's value.
///
/// Values written by [`TaggedStore::set`] live in a single-field record so
/// later fields can be added without migrating the key scheme.
pub const BODY_FIELD: &str = "body";

/// Contract consumed by the wider system for key-value persistence.
#[allow(async_fn_in_trait)]
pub trait KeyValueStorage {
    /// Fetch the value stored under `key`.
    ///
    /// An absent key yields an empty string; callers that need presence
    /// semantics must check existence first.
    async fn get(&mut self, key: &str) -> Result<String>;

    /// First-write insert.
    ///
    /// # Errors
    /// `Error::AlreadyExists` if the key is present; the stored value is
    /// not overwritten.
    async fn add(&mut self, key: &str, value: &str) -> Result<bool>;

    /// Remove `key`. Deleting a nonexistent key is not an error.
    async fn delete(&mut self, key: &str) -> Result<bool>;

    /// Raw membership lists per tag, without dereferencing values.
    async fn get_by_tags(&mut self, tags: &[&str]) -> Result<HashMap<String, Vec<String>>>;

    /// Add `key` to each tag's member set. Must add all or none.
    async fn add_tags(&mut self, key: &str, tags: &[&str]) -> bool;

    /// Remove `key` from each tag's member set. Must remove all or none.
    async fn remove_tags(&mut self, key: &str, tags: &[&str]) -> bool;
}

/// Tagged, compressed key-value store.
///
/// The only component the wider system interacts with for persistence.
/// Wraps a [`ConnectionManager`] for transport and applies the compression
/// codec on every write path and its inverse on every read path; the
/// envelope prefix makes stored values self-describing, so the configured
/// algorithm can change at any time.
pub struct TaggedStore<T: StoreTransport> {
    manager: ConnectionManager<T>,
}

impl<T: StoreTransport> TaggedStore<T> {
    pub fn new(manager: ConnectionManager<T>) -> Self {
        TaggedStore { manager }
    }

    /// Connection manager backing this store.
    pub fn manager(&self) -> &ConnectionManager<T> {
        &self.manager
    }

    /// Mutable access to the connection manager, for liveness probes and
    /// explicit close.
    pub fn manager_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.manager
    }

    /// Store `value` under `key` and index it under each tag in `tags`.
    ///
    /// The value lands in the [`BODY_FIELD`] of the key's record, then the
    /// tags are applied. These are two separate steps against the backing
    /// store: a crash between them leaves a value with no tag index entry.
    /// Returns the tag-application outcome.
    pub async fn set(&mut self, key: &str, value: &str, tags: &[&str]) -> Result<bool> {
        let payload = self.encode(value);
        self.manager
            .transport_mut()
            .hash_set(key, BODY_FIELD, payload)
            .await?;
        Ok(self.add_tags(key, tags).await)
    }

    /// Fetch the bodies of every member of `tag`.
    ///
    /// Order follows the member set's iteration order, which the backing
    /// store leaves unspecified; callers must not rely on it. A member
    /// whose value has been deleted contributes an empty string.
    pub async fn get_by_tag(&mut self, tag: &str) -> Result<Vec<String>> {
        let members = self.manager.transport_mut().set_members(tag).await?;
        let mut values = Vec::with_capacity(members.len());
        for member in members {
            match self
                .manager
                .transport_mut()
                .hash_get(&member, BODY_FIELD)
                .await?
            {
                Some(raw) => values.push(Self::decode(raw)?),
                None => values.push(String::new()),
            }
        }
        Ok(values)
    }

    fn encode(&self, value: &str) -> Vec<u8> {
        let config = self.manager.config();
        codec::encode(
            value.as_bytes(),
            config.compression_threshold,
            config.compression_algorithm,
        )
    }

    fn decode(raw: Vec<u8>) -> Result<String> {
        let plain = codec::decode(&raw)?;
        Ok(String::from_utf8_lossy(&plain).into_owned())
    }
}

impl<T: StoreTransport> KeyValueStorage for TaggedStore<T> {
    async fn get(&mut self, key: &str) -> Result<String> {
        match self.manager.transport_mut().get(key).await? {
            Some(raw) => Self::decode(raw),
            None => Ok(String::new()),
        }
    }

    async fn add(&mut self, key: &str, value: &str) -> Result<bool> {
        // Check-then-write; not atomic against concurrent writers of the
        // same key.
        if self.manager.transport_mut().exists(key).await? {
            return Err(Error::AlreadyExists(key.to_string()));
        }

        let payload = self.encode(value);
        self.manager.transport_mut().set(key, payload).await?;
        Ok(true)
    }

    async fn delete(&mut self, key: &str) -> Result<bool> {
        self.manager.transport_mut().del(key).await?;
        Ok(true)
    }

    async fn get_by_tags(&mut self, tags: &[&str]) -> Result<HashMap<String, Vec<String>>> {
        let mut result = HashMap::with_capacity(tags.len());
        for tag in tags {
            let members = self.manager.transport_mut().set_members(tag).await?;
            result.insert((*tag).to_string(), members);
        }
        Ok(result)
    }

    async fn add_tags(&mut self, key: &str, tags: &[&str]) -> bool {
        for tag in tags {
            if let Err(e) = self.manager.transport_mut().set_add(tag, key).await {
                // Tags applied before the failure stay applied
                warn!("Failed to tag {} with {}: {}", key, tag, e);
                return false;
            }
        }
        true
    }

    // TODO: roll back memberships applied before a failure so the
    // all-or-none contract holds.
    async fn remove_tags(&mut self, key: &str, tags: &[&str]) -> bool {
        for tag in tags {
            if let Err(e) = self.manager.transport_mut().set_remove(tag, key).await {
                warn!("Failed to untag {} from {}: {}", key, tag, e);
                return false;
            }
        }
        true
    }
}
