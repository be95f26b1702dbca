//! Cache storage behind the enrichment pipeline.
//!
//! Every cached value lives in a namespace so job records, enrichment
//! results, page content and search results never collide even when
//! their keys happen to match. Failures here are advisory: callers
//! treat a cache error as a miss and keep going.

pub mod keys;
pub mod memory;
pub mod postgres;

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryCacheStore;
pub use postgres::PgCacheStore;

/// Logical partitions of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Job status records, keyed by job id.
    Job,
    /// Finished enrichment results, keyed by identity key.
    Result,
    /// Fetched page content, keyed by url key.
    Url,
    /// Raw search results, keyed by query+limit key.
    Search,
    /// In-flight job markers, keyed by identity key.
    Inflight,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Job => "job",
            Namespace::Result => "cache",
            Namespace::Url => "url",
            Namespace::Search => "search",
            Namespace::Inflight => "inflight",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Namespaced string cache with per-entry TTLs.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a value. `Ok(None)` means missing or expired.
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<String>>;

    /// Store a value with a TTL, replacing any previous entry.
    async fn set(&self, ns: Namespace, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove an entry. Returns whether a live entry existed.
    async fn delete(&self, ns: Namespace, key: &str) -> Result<bool>;

    /// Backend reachability probe for health reporting.
    async fn ping(&self) -> bool;
}
