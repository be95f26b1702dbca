//! In-memory cache store. Used in tests and as a fallback when no
//! database is configured; entries expire lazily on read.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CacheStore, Namespace};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<(Namespace, String), Entry>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries, for test assertions.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        entries.values().filter(|e| e.expires_at > now).count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        let map_key = (ns, key.to_string());
        match entries.get(&map_key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(&map_key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, ns: Namespace, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            (ns, key.to_string()),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        match entries.remove(&(ns, key.to_string())) {
            Some(entry) => Ok(entry.expires_at > Instant::now()),
            None => Ok(false),
        }
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let store = MemoryCacheStore::new();
        store
            .set(Namespace::Url, "abc", "content", Duration::from_secs(60))
            .await
            .unwrap();
        let got = store.get(Namespace::Url, "abc").await.unwrap();
        assert_eq!(got.as_deref(), Some("content"));
    }

    #[tokio::test]
    async fn test_namespaces_do_not_collide() {
        let store = MemoryCacheStore::new();
        store
            .set(Namespace::Url, "same-key", "page", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .set(Namespace::Search, "same-key", "results", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get(Namespace::Url, "same-key").await.unwrap().as_deref(),
            Some("page")
        );
        assert_eq!(
            store
                .get(Namespace::Search, "same-key")
                .await
                .unwrap()
                .as_deref(),
            Some("results")
        );
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let store = MemoryCacheStore::new();
        store
            .set(Namespace::Url, "abc", "content", Duration::from_secs(0))
            .await
            .unwrap();
        assert_eq!(store.get(Namespace::Url, "abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_reports_liveness() {
        let store = MemoryCacheStore::new();
        store
            .set(Namespace::Job, "j1", "{}", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.delete(Namespace::Job, "j1").await.unwrap());
        assert!(!store.delete(Namespace::Job, "j1").await.unwrap());
    }
}
