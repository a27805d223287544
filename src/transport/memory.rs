//! In-process transport for tests and local development.

use super::StoreTransport;
use crate::error::Result;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

/// In-memory implementation of the transport capability set.
///
/// Behaves like an always-reachable store: `ping` and `close` always
/// succeed. Plain keys, records and sets live in separate maps, which is
/// sufficient for the key schemes this layer produces.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    strings: DashMap<String, Vec<u8>>,
    hashes: DashMap<String, HashMap<String, Vec<u8>>>,
    sets: DashMap<String, HashSet<String>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        InMemoryTransport::default()
    }
}

impl StoreTransport for InMemoryTransport {
    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.strings.get(key).map(|v| v.value().clone()))
    }

    async fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.strings.insert(key.to_string(), value);
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.strings.contains_key(key)
            || self.hashes.contains_key(key)
            || self.sets.contains_key(key))
    }

    async fn del(&mut self, key: &str) -> Result<bool> {
        let string = self.strings.remove(key).is_some();
        let hash = self.hashes.remove(key).is_some();
        let set = self.sets.remove(key).is_some();
        Ok(string || hash || set)
    }

    async fn hash_set(&mut self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|record| record.get(field).cloned()))
    }

    async fn set_add(&mut self, set: &str, member: &str) -> Result<()> {
        self.sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&mut self, set: &str, member: &str) -> Result<()> {
        let emptied = match self.sets.get_mut(set) {
            Some(mut members) => {
                members.remove(member);
                members.is_empty()
            }
            None => false,
        };
        // An empty set is indistinguishable from one that never existed
        if emptied {
            self.sets.remove(set);
        }
        Ok(())
    }

    async fn set_members(&mut self, set: &str) -> Result<Vec<String>> {
        Ok(self
            .sets
            .get(set)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_key_operations() {
        let mut transport = InMemoryTransport::new();

        assert!(transport.get("k").await.expect("get").is_none());
        assert!(!transport.exists("k").await.expect("exists"));

        transport.set("k", b"v".to_vec()).await.expect("set");
        assert_eq!(transport.get("k").await.expect("get"), Some(b"v".to_vec()));
        assert!(transport.exists("k").await.expect("exists"));

        assert!(transport.del("k").await.expect("del"));
        assert!(!transport.del("k").await.expect("del"));
        assert!(transport.get("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_record_field_operations() {
        let mut transport = InMemoryTransport::new();

        transport
            .hash_set("k", "body", b"v".to_vec())
            .await
            .expect("hash_set");
        assert_eq!(
            transport.hash_get("k", "body").await.expect("hash_get"),
            Some(b"v".to_vec())
        );
        assert!(transport
            .hash_get("k", "other")
            .await
            .expect("hash_get")
            .is_none());

        // Records count towards existence and are removed by del
        assert!(transport.exists("k").await.expect("exists"));
        assert!(transport.del("k").await.expect("del"));
        assert!(transport
            .hash_get("k", "body")
            .await
            .expect("hash_get")
            .is_none());
    }

    #[tokio::test]
    async fn test_set_operations() {
        let mut transport = InMemoryTransport::new();

        transport.set_add("tag", "k1").await.expect("set_add");
        transport.set_add("tag", "k2").await.expect("set_add");
        transport.set_add("tag", "k2").await.expect("set_add");

        let mut members = transport.set_members("tag").await.expect("set_members");
        members.sort();
        assert_eq!(members, vec!["k1".to_string(), "k2".to_string()]);

        transport.set_remove("tag", "k1").await.expect("set_remove");
        assert_eq!(
            transport.set_members("tag").await.expect("set_members"),
            vec!["k2".to_string()]
        );

        // Removing the last member makes the set vanish entirely
        transport.set_remove("tag", "k2").await.expect("set_remove");
        assert!(!transport.exists("tag").await.expect("exists"));
        assert!(transport
            .set_members("tag")
            .await
            .expect("set_members")
            .is_empty());
    }

    #[tokio::test]
    async fn test_ping_and_close_always_succeed() {
        let mut transport = InMemoryTransport::new();
        transport.ping().await.expect("ping");
        transport.close().await.expect("close");
        transport.close().await.expect("close");
        transport.ping().await.expect("ping");
    }
}
