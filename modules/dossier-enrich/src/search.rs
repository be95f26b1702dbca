//! Search result aggregation.
//!
//! Raw provider records are cached per (query, limit) before any
//! filtering, so exclusion rules can change without invalidating the
//! cache. Empty result lists are cached too: a query that found
//! nothing stays answered until the entry expires.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{keys, CacheStore, Namespace};
use crate::providers::{SearchRecord, WebSearcher};

/// Url-based exclusion rule applied after the cache.
pub type UrlPredicate = fn(&str) -> bool;

/// A search hit reduced to what the synthesis prompts consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub url: String,
    pub title: String,
    pub content: String,
}

pub struct SearchAggregator {
    searcher: Arc<dyn WebSearcher>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SearchAggregator {
    pub fn new(searcher: Arc<dyn WebSearcher>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            searcher,
            cache,
            ttl,
        }
    }

    /// Canonical records for one query, from cache or provider.
    pub async fn records(&self, query: &str, limit: usize) -> Result<Vec<SearchRecord>> {
        self.records_as(query, query, limit).await
    }

    /// Same as [`Self::records`] but cached under a separate label, so
    /// differently-scoped searches for the same text keep distinct
    /// entries.
    pub async fn records_as(
        &self,
        cache_label: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchRecord>> {
        let key = keys::search_key(cache_label, limit);
        match self.cache.get(Namespace::Search, &key).await {
            Ok(Some(cached)) => match serde_json::from_str(&cached) {
                Ok(records) => {
                    debug!(query, "Search cache hit");
                    return Ok(records);
                }
                Err(_) => warn!(query, "Discarding undecodable search cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(query, error = %e, "Search cache read failed"),
        }

        let records = self.searcher.search(query, limit).await?;
        match serde_json::to_string(&records) {
            Ok(payload) => {
                if let Err(e) = self
                    .cache
                    .set(Namespace::Search, &key, &payload, self.ttl)
                    .await
                {
                    warn!(query, error = %e, "Search cache write failed");
                }
            }
            Err(e) => warn!(query, error = %e, "Search records not serializable"),
        }
        Ok(records)
    }
}

/// Reduce raw records to usable items: empty and already-seen urls are
/// dropped, exclusion rules are applied, and each survivor keeps its
/// best content variant. Items whose content is empty survive; a bare
/// url and title is still a lead.
pub fn filter_records(
    records: Vec<SearchRecord>,
    excluded: &[UrlPredicate],
    seen: &mut HashSet<String>,
) -> Vec<SearchItem> {
    let mut items = Vec::new();
    for record in records {
        if record.url.is_empty() || seen.contains(&record.url) {
            continue;
        }
        if excluded.iter().any(|matches| matches(&record.url)) {
            continue;
        }
        let content = record.content().to_string();
        seen.insert(record.url.clone());
        items.push(SearchItem {
            url: record.url,
            title: record.title,
            content,
        });
    }
    items
}
