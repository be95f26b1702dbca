//! Outbound provider adapters.
//!
//! Every external service sits behind a small trait so the pipeline
//! depends on behavior rather than vendors. Adapters own their HTTP
//! clients and normalize vendor envelopes into canonical types at the
//! boundary; nothing past this module knows which provider answered.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use twitterwrapped_client::TwitterWrappedClient;

const FIRECRAWL_SCRAPE_URL: &str = "https://api.firecrawl.dev/v2/scrape";
const FIRECRAWL_SEARCH_URL: &str = "https://api.firecrawl.dev/v2/search";
const EXA_CONTENTS_URL: &str = "https://api.exa.ai/contents";

// ---------------------------------------------------------------------------
// Canonical types
// ---------------------------------------------------------------------------

/// One search hit in provider-independent shape. All content variants
/// are preserved as returned so cached records survive provider drift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchRecord {
    /// Best available content: full markdown, else description, else snippet.
    pub fn content(&self) -> &str {
        if !self.markdown.is_empty() {
            &self.markdown
        } else if !self.description.is_empty() {
            &self.description
        } else {
            &self.snippet
        }
    }
}

/// A social profile page in normalized form. An unconfigured scraper
/// yields the empty default so downstream merging sees a uniform shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub full_text: String,
}

// ---------------------------------------------------------------------------
// Trait seams
// ---------------------------------------------------------------------------

/// Fetches a single page as text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Short provider name for logging.
    fn name(&self) -> &str;
}

/// Runs a web search and returns canonical records.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchRecord>>;
}

/// Fetches a user's recent tweets rendered as plain text.
#[async_trait]
pub trait TweetScraper: Send + Sync {
    async fn profile_text(&self, username: &str) -> Result<String>;
}

/// Scrapes a social profile page into structured form.
#[async_trait]
pub trait SocialScraper: Send + Sync {
    async fn profile(&self, url: &str) -> Result<SocialProfile>;
}

// ---------------------------------------------------------------------------
// Firecrawl
// ---------------------------------------------------------------------------

pub struct FirecrawlFetcher {
    api_key: String,
    client: reqwest::Client,
}

impl FirecrawlFetcher {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self { api_key, client }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FirecrawlScrapeResponse {
    #[serde(default)]
    data: FirecrawlScrapeData,
}

#[derive(Debug, Default, Deserialize)]
struct FirecrawlScrapeData {
    #[serde(default)]
    markdown: String,
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, fetcher = self.name(), "Fetching page");
        let response = self
            .client
            .post(FIRECRAWL_SCRAPE_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "url": url,
                "formats": ["markdown"],
                "onlyMainContent": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Firecrawl API error ({}): {}", status, error_text));
        }

        let parsed: FirecrawlScrapeResponse = response.json().await?;
        Ok(parsed.data.markdown)
    }

    fn name(&self) -> &str {
        "firecrawl"
    }
}

pub struct FirecrawlSearcher {
    api_key: String,
    client: reqwest::Client,
}

impl FirecrawlSearcher {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .expect("Failed to build HTTP client");
        Self { api_key, client }
    }
}

#[async_trait]
impl WebSearcher for FirecrawlSearcher {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchRecord>> {
        debug!(query, limit, "Searching web");
        let response = self
            .client
            .post(FIRECRAWL_SEARCH_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query": query,
                "limit": limit,
                "scrapeOptions": {"formats": ["markdown"], "onlyMainContent": true},
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Firecrawl API error ({}): {}", status, error_text));
        }

        let body: Value = response.json().await?;
        Ok(normalize_search_payload(body))
    }
}

/// Flattens the search response envelope into records. The endpoint has
/// shipped hits as `data: [...]`, `data: {web: [...]}` and a bare list;
/// non-object items are dropped.
fn normalize_search_payload(body: Value) -> Vec<SearchRecord> {
    let results = match body.get("data") {
        Some(data) => data.clone(),
        None => body,
    };
    let items = match results {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("web") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        other => vec![other],
    };

    items
        .into_iter()
        .filter(|item| item.is_object())
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Exa
// ---------------------------------------------------------------------------

pub struct ExaFetcher {
    api_key: String,
    client: reqwest::Client,
}

impl ExaFetcher {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self { api_key, client }
    }
}

#[derive(Debug, Deserialize)]
struct ExaContentsResponse {
    #[serde(default)]
    results: Vec<ExaContentsResult>,
}

#[derive(Debug, Default, Deserialize)]
struct ExaContentsResult {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl PageFetcher for ExaFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, fetcher = self.name(), "Fetching page");
        let response = self
            .client
            .post(EXA_CONTENTS_URL)
            .header("x-api-key", &self.api_key)
            .json(&json!({"urls": [url], "text": true}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Exa API error ({}): {}", status, error_text));
        }

        let parsed: ExaContentsResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|r| r.text)
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "exa"
    }
}

// ---------------------------------------------------------------------------
// Tweets
// ---------------------------------------------------------------------------

pub struct TwitterWrappedScraper {
    client: TwitterWrappedClient,
}

impl TwitterWrappedScraper {
    pub fn new() -> Self {
        Self {
            client: TwitterWrappedClient::new(),
        }
    }
}

impl Default for TwitterWrappedScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TweetScraper for TwitterWrappedScraper {
    async fn profile_text(&self, username: &str) -> Result<String> {
        let archive = self.client.fetch_tweets(username).await?;
        Ok(archive.render())
    }
}

// ---------------------------------------------------------------------------
// Social profiles
// ---------------------------------------------------------------------------

/// Stand-in scraper for deployments without a social profile provider.
pub struct NoopSocialScraper;

#[async_trait]
impl SocialScraper for NoopSocialScraper {
    async fn profile(&self, _url: &str) -> Result<SocialProfile> {
        Ok(SocialProfile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_prefers_markdown() {
        let record = SearchRecord {
            markdown: "# Full page".into(),
            description: "desc".into(),
            snippet: "snip".into(),
            ..Default::default()
        };
        assert_eq!(record.content(), "# Full page");
    }

    #[test]
    fn test_content_falls_back_in_order() {
        let record = SearchRecord {
            description: "desc".into(),
            snippet: "snip".into(),
            ..Default::default()
        };
        assert_eq!(record.content(), "desc");

        let record = SearchRecord {
            snippet: "snip".into(),
            ..Default::default()
        };
        assert_eq!(record.content(), "snip");
    }

    #[test]
    fn test_normalize_flat_data_list() {
        let body = json!({"data": [
            {"url": "https://a.dev", "title": "A", "markdown": "body"},
            {"url": "https://b.dev", "title": "B"},
        ]});
        let records = normalize_search_payload(body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://a.dev");
        assert_eq!(records[0].markdown, "body");
    }

    #[test]
    fn test_normalize_nested_web_list() {
        let body = json!({"data": {"web": [
            {"url": "https://a.dev", "snippet": "hello"},
        ]}});
        let records = normalize_search_payload(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].snippet, "hello");
    }

    #[test]
    fn test_normalize_bare_list_body() {
        let body = json!([{"url": "https://a.dev"}, "junk", 42]);
        let records = normalize_search_payload(body);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://a.dev");
    }

    #[test]
    fn test_normalize_object_without_web_is_empty() {
        let body = json!({"data": {"status": "ok"}});
        assert!(normalize_search_payload(body).is_empty());
    }
}
