// Test mocks for the enrichment pipeline.
//
// One mock per trait boundary:
// - MockPageFetcher (PageFetcher): HashMap-based url to content
// - MockWebSearcher (WebSearcher): HashMap-based query to records
// - MockTweetScraper (TweetScraper): HashMap-based username to text
// - StubSocialScraper (SocialScraper): one canned profile
// - StubSynthesizer (Synthesizer): canned outputs, recorded inputs
//
// Plus small constructors for canonical types.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::accumulate::ContentItem;
use crate::github::GithubPresence;
use crate::providers::{
    PageFetcher, SearchRecord, SocialProfile, SocialScraper, TweetScraper, WebSearcher,
};
use crate::search::SearchItem;
use crate::synth::{ResumeInfo, Synthesizer};

/// A search record with just a url and title.
pub fn record(url: &str, title: &str) -> SearchRecord {
    SearchRecord {
        url: url.to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// MockPageFetcher
// ---------------------------------------------------------------------------

/// HashMap-based page fetcher. Returns `Err` for unregistered urls and
/// counts every fetch attempt. Builder pattern: `.on_page()`.
pub struct MockPageFetcher {
    name: String,
    pages: HashMap<String, String>,
    calls: Mutex<usize>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pages: HashMap::new(),
            calls: Mutex::new(0),
        }
    }

    pub fn on_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockPageFetcher: no page registered for {url}"))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// MockWebSearcher
// ---------------------------------------------------------------------------

/// HashMap-based searcher. Returns `Err` for unregistered queries and
/// counts every search attempt. Builder pattern: `.on_query()`.
pub struct MockWebSearcher {
    queries: HashMap<String, Vec<SearchRecord>>,
    calls: Mutex<usize>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self {
            queries: HashMap::new(),
            calls: Mutex::new(0),
        }
    }

    pub fn on_query(mut self, query: &str, records: Vec<SearchRecord>) -> Self {
        self.queries.insert(query.to_string(), records);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str, _limit: usize) -> Result<Vec<SearchRecord>> {
        *self.calls.lock().unwrap() += 1;
        self.queries
            .get(query)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockWebSearcher: no results registered for {query}"))
    }
}

// ---------------------------------------------------------------------------
// MockTweetScraper
// ---------------------------------------------------------------------------

/// HashMap-based tweet scraper. Returns `Err` for unregistered usernames.
pub struct MockTweetScraper {
    users: HashMap<String, String>,
}

impl MockTweetScraper {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
        }
    }

    pub fn on_user(mut self, username: &str, text: &str) -> Self {
        self.users.insert(username.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl TweetScraper for MockTweetScraper {
    async fn profile_text(&self, username: &str) -> Result<String> {
        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockTweetScraper: no tweets registered for {username}"))
    }
}

// ---------------------------------------------------------------------------
// StubSocialScraper
// ---------------------------------------------------------------------------

/// Social scraper returning one canned profile for every url.
pub struct StubSocialScraper {
    profile: SocialProfile,
}

impl StubSocialScraper {
    pub fn new() -> Self {
        Self {
            profile: SocialProfile::default(),
        }
    }

    pub fn with_full_text(mut self, text: &str) -> Self {
        self.profile.full_text = text.to_string();
        self
    }
}

#[async_trait]
impl SocialScraper for StubSocialScraper {
    async fn profile(&self, _url: &str) -> Result<SocialProfile> {
        Ok(self.profile.clone())
    }
}

// ---------------------------------------------------------------------------
// StubSynthesizer
// ---------------------------------------------------------------------------

/// Inputs the stub saw, for assertions on what reached the model.
#[derive(Default)]
struct RecordedCalls {
    merge_calls: usize,
    merge_crawled_urls: Vec<String>,
    merge_search_urls: Vec<String>,
    narrative_content: Option<String>,
}

/// Canned synthesizer. Every method succeeds with an empty-ish default
/// unless configured otherwise; `failing_*` builders force errors and
/// `panicking_merges` forces a panic to exercise task supervision.
pub struct StubSynthesizer {
    resume: ResumeInfo,
    queries: Vec<String>,
    merge: Option<Value>,
    summary: String,
    narrative: String,
    fail_queries: bool,
    fail_merges: bool,
    panic_merges: bool,
    fail_summaries: bool,
    recorded: Mutex<RecordedCalls>,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        Self {
            resume: ResumeInfo::default(),
            queries: Vec::new(),
            merge: None,
            summary: String::new(),
            narrative: String::new(),
            fail_queries: false,
            fail_merges: false,
            panic_merges: false,
            fail_summaries: false,
            recorded: Mutex::new(RecordedCalls::default()),
        }
    }

    pub fn with_resume(mut self, resume: ResumeInfo) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_queries(mut self, queries: &[&str]) -> Self {
        self.queries = queries.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn with_merge(mut self, merged: Value) -> Self {
        self.merge = Some(merged);
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    pub fn with_narrative(mut self, narrative: &str) -> Self {
        self.narrative = narrative.to_string();
        self
    }

    /// Make `search_queries` return an error for every call.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Make `merge_profile` return an error for every call.
    pub fn failing_merges(mut self) -> Self {
        self.fail_merges = true;
        self
    }

    /// Make `merge_profile` panic, simulating a bug in the pipeline.
    pub fn panicking_merges(mut self) -> Self {
        self.panic_merges = true;
        self
    }

    /// Make `code_summary` return an error for every call.
    pub fn failing_summaries(mut self) -> Self {
        self.fail_summaries = true;
        self
    }

    // --- Assertion helpers ---

    pub fn merge_calls(&self) -> usize {
        self.recorded.lock().unwrap().merge_calls
    }

    /// Urls of the crawled items passed to the last `merge_profile` call.
    pub fn last_merge_crawled_urls(&self) -> Vec<String> {
        self.recorded.lock().unwrap().merge_crawled_urls.clone()
    }

    /// Urls of the search items passed to the last `merge_profile` call.
    pub fn last_merge_search_urls(&self) -> Vec<String> {
        self.recorded.lock().unwrap().merge_search_urls.clone()
    }

    /// The gathered content passed to the last `narrative` call.
    pub fn last_narrative_content(&self) -> Option<String> {
        self.recorded.lock().unwrap().narrative_content.clone()
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn resume_details(&self, _resume_text: &str) -> Result<ResumeInfo> {
        Ok(self.resume.clone())
    }

    async fn search_queries(
        &self,
        _name: &str,
        _occupation: &str,
        _location: &str,
        _usernames: &[String],
    ) -> Result<Vec<String>> {
        if self.fail_queries {
            bail!("StubSynthesizer: search_queries forced failure");
        }
        Ok(self.queries.clone())
    }

    async fn merge_profile(
        &self,
        seed: &Value,
        crawled: &[ContentItem],
        search_items: &[SearchItem],
        _github: &GithubPresence,
    ) -> Result<Value> {
        {
            let mut recorded = self.recorded.lock().unwrap();
            recorded.merge_calls += 1;
            recorded.merge_crawled_urls = crawled.iter().map(|c| c.url.clone()).collect();
            recorded.merge_search_urls = search_items.iter().map(|s| s.url.clone()).collect();
        }
        if self.panic_merges {
            panic!("StubSynthesizer: merge_profile forced panic");
        }
        if self.fail_merges {
            bail!("StubSynthesizer: merge_profile forced failure");
        }
        Ok(self.merge.clone().unwrap_or_else(|| seed.clone()))
    }

    async fn code_summary(
        &self,
        _name: &str,
        _usernames: &[String],
        _results: &[SearchItem],
    ) -> Result<String> {
        if self.fail_summaries {
            bail!("StubSynthesizer: code_summary forced failure");
        }
        Ok(self.summary.clone())
    }

    async fn narrative(&self, _profile: &Value, all_content: &str) -> Result<String> {
        self.recorded.lock().unwrap().narrative_content = Some(all_content.to_string());
        Ok(self.narrative.clone())
    }
}

// ---------------------------------------------------------------------------
// StubSynthesizer self-tests
// ---------------------------------------------------------------------------
