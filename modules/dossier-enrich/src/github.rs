//! GitHub presence search.
//!
//! Runs its own search pass with the person's usernames and name,
//! keeps only github.com hits, and splits them into profile pages and
//! repositories by path depth. A summary is generated when anything
//! was found; summary failure leaves the hits intact.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use dossier_common::urls::is_github_url;

use crate::search::{SearchAggregator, SearchItem};
use crate::synth::Synthesizer;

/// Results per github search query.
const GITHUB_SEARCH_LIMIT: usize = 5;
/// How many usernames seed search queries.
const MAX_USERNAME_QUERIES: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubPresence {
    pub summary: String,
    pub profiles: Vec<SearchItem>,
    pub repositories: Vec<SearchItem>,
}

impl GithubPresence {
    /// Whether the presence carries anything worth attaching to a
    /// profile. Repositories without a summary or profile page are not
    /// enough on their own.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.profiles.is_empty()
    }
}

/// Search queries for a person's github presence: up to three known
/// usernames, then the name itself (with occupation when available).
fn build_queries(name: &str, usernames: &[String], occupation: &str) -> Vec<String> {
    let mut queries: Vec<String> = usernames
        .iter()
        .take(MAX_USERNAME_QUERIES)
        .cloned()
        .collect();
    if !name.is_empty() {
        if occupation.is_empty() {
            queries.push(name.to_string());
        } else {
            queries.push(format!("{name} {occupation}"));
        }
    }
    queries
}

/// Profile pages sit directly under github.com; anything deeper is a
/// repository or a file inside one.
fn is_profile_path(url: &str) -> bool {
    let lower = url.to_lowercase();
    let path = lower
        .split_once("github.com/")
        .map(|(_, rest)| rest)
        .unwrap_or(lower.as_str());
    path.split('/').filter(|segment| !segment.is_empty()).count() <= 1
}

pub async fn github_presence(
    aggregator: &SearchAggregator,
    synthesizer: &dyn Synthesizer,
    name: &str,
    usernames: &[String],
    occupation: &str,
) -> GithubPresence {
    let queries = build_queries(name, usernames, occupation);

    let mut presence = GithubPresence::default();
    let mut all_results: Vec<SearchItem> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for query in &queries {
        let label = format!("github:{query}");
        let records = match aggregator
            .records_as(&label, query, GITHUB_SEARCH_LIMIT)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(query, error = %e, "GitHub search failed, continuing");
                continue;
            }
        };

        for record in records {
            if record.url.is_empty() || seen.contains(&record.url) || !is_github_url(&record.url) {
                continue;
            }
            seen.insert(record.url.clone());

            let content = record.content().to_string();
            let item = SearchItem {
                url: record.url,
                title: record.title,
                content,
            };
            all_results.push(item.clone());
            if is_profile_path(&item.url) {
                presence.profiles.push(item);
            } else {
                presence.repositories.push(item);
            }
        }
    }

    if !all_results.is_empty() {
        match synthesizer.code_summary(name, usernames, &all_results).await {
            Ok(summary) => presence.summary = summary,
            Err(e) => warn!(error = %e, "GitHub summary generation failed"),
        }
    }

    info!(
        profiles = presence.profiles.len(),
        repositories = presence.repositories.len(),
        "GitHub presence search finished"
    );
    presence
}
