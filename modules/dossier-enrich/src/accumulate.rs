//! Content accumulation for one enrichment run.
//!
//! Gathers page content and search hits, keeps urls unique with the
//! first source winning, and folds everything into the profile through
//! the synthesizer. Merge output is validated before anyone reads it.

use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use dossier_common::profile::ensure_required_groups;

use crate::fetch::FallbackFetcher;
use crate::github::GithubPresence;
use crate::search::{filter_records, SearchAggregator, SearchItem, UrlPredicate};
use crate::synth::Synthesizer;

/// Upper bound on search queries per run.
pub const MAX_SEARCH_QUERIES: usize = 6;

/// Results requested per person search query.
pub const SEARCH_RESULT_LIMIT: usize = 3;

const CRAWL_CONCURRENCY: usize = 5;

/// A crawled page paired with its source url.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub url: String,
    pub content: String,
}

/// Crawl every unique link concurrently. Pages that yield nothing are
/// dropped; output order follows first appearance in the input.
pub async fn crawl_links(fetcher: &FallbackFetcher, links: &[String]) -> Vec<ContentItem> {
    let mut unique: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for link in links {
        if !link.is_empty() && seen.insert(link.as_str()) {
            unique.push(link.clone());
        }
    }

    let fetched: HashMap<String, String> =
        stream::iter(unique.iter().cloned().map(|url| async move {
            let content = fetcher.fetch(&url).await;
            (url, content)
        }))
        .buffer_unordered(CRAWL_CONCURRENCY)
        .collect()
        .await;

    unique
        .into_iter()
        .filter_map(|url| {
            let content = fetched.get(&url).cloned().unwrap_or_default();
            if content.is_empty() {
                None
            } else {
                Some(ContentItem { url, content })
            }
        })
        .collect()
}

/// Run up to [`MAX_SEARCH_QUERIES`] queries through the aggregator. A
/// failed query logs and the rest continue; urls already taken by an
/// earlier query are dropped.
pub async fn gather_search_items(
    aggregator: &SearchAggregator,
    queries: &[String],
    limit: usize,
    excluded: &[UrlPredicate],
) -> Vec<SearchItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for query in queries.iter().take(MAX_SEARCH_QUERIES) {
        match aggregator.records(query, limit).await {
            Ok(records) => items.extend(filter_records(records, excluded, &mut seen)),
            Err(e) => warn!(query, error = %e, "Search query failed, continuing"),
        }
    }
    items
}

/// Drop search hits for urls that were already crawled directly. The
/// crawled copy carries the full page, so it wins.
pub fn dedup_against_crawled(crawled: &[ContentItem], items: Vec<SearchItem>) -> Vec<SearchItem> {
    let crawled_urls: HashSet<&str> = crawled.iter().map(|c| c.url.as_str()).collect();
    items
        .into_iter()
        .filter(|item| !crawled_urls.contains(item.url.as_str()))
        .collect()
}

/// Merge everything into the seed profile. The synthesizer's output is
/// untrusted: a failed or non-object merge falls back to the seed, and
/// the required top-level groups are always restored afterwards.
pub async fn enrich_profile(
    synthesizer: &dyn Synthesizer,
    seed: &Value,
    crawled: &[ContentItem],
    search_items: &[SearchItem],
    github: &GithubPresence,
) -> Value {
    let mut merged = match synthesizer
        .merge_profile(seed, crawled, search_items, github)
        .await
    {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            warn!("Merge produced a non-object profile, keeping seed");
            seed.clone()
        }
        Err(e) => {
            warn!(error = %e, "Profile merge failed, keeping seed");
            seed.clone()
        }
    };
    ensure_required_groups(&mut merged);
    merged
}

/// Concatenate everything gathered for the narrative prompt. Empty
/// parts are skipped; the github summary gets a labeled block.
pub fn assemble_profile_text(
    resume_text: &str,
    social_text: &str,
    crawled: &[ContentItem],
    search_items: &[SearchItem],
    github_summary: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !resume_text.is_empty() {
        parts.push(resume_text.to_string());
    }
    if !social_text.is_empty() {
        parts.push(social_text.to_string());
    }
    parts.extend(
        crawled
            .iter()
            .filter(|c| !c.content.is_empty())
            .map(|c| c.content.clone()),
    );
    parts.extend(
        search_items
            .iter()
            .filter(|i| !i.content.is_empty())
            .map(|i| i.content.clone()),
    );
    if !github_summary.is_empty() {
        parts.push(format!("GitHub Summary:\n{github_summary}"));
    }
    parts.join("\n\n")
}
