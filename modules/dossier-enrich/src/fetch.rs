//! Page fetching with provider fallback.
//!
//! One url goes in, text comes out, and the caller never sees an error:
//! provider failures degrade to the next provider and total failure
//! yields the empty string. Successful fetches land in the url cache so
//! repeat lookups skip the providers entirely.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use dossier_common::urls::{extract_twitter_username, is_linkedin_url, is_twitter_url, normalize_url};

use crate::cache::{keys, CacheStore, Namespace};
use crate::providers::{PageFetcher, TweetScraper};

pub struct FallbackFetcher {
    providers: Vec<Arc<dyn PageFetcher>>,
    tweets: Arc<dyn TweetScraper>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl FallbackFetcher {
    pub fn new(
        providers: Vec<Arc<dyn PageFetcher>>,
        tweets: Arc<dyn TweetScraper>,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        Self {
            providers,
            tweets,
            cache,
            ttl,
        }
    }

    /// Fetch a page as text. Empty string means nothing could be
    /// retrieved; the url cache holds only non-empty results, so a
    /// failed fetch gets retried on the next request.
    pub async fn fetch(&self, url: &str) -> String {
        if url.trim().is_empty() {
            return String::new();
        }
        let url = normalize_url(url);

        // Profile pages on networks that block scraping are skipped
        // outright, without poisoning the cache.
        if is_linkedin_url(&url) {
            debug!(url = %url, "Skipping blocked profile URL");
            return String::new();
        }

        let key = keys::url_key(&url);
        match self.cache.get(Namespace::Url, &key).await {
            Ok(Some(cached)) => {
                debug!(url = %url, "Url cache hit");
                return cached;
            }
            Ok(None) => {}
            Err(e) => warn!(url = %url, error = %e, "Url cache read failed"),
        }

        if is_twitter_url(&url) {
            if let Some(username) = extract_twitter_username(&url) {
                match self.tweets.profile_text(&username).await {
                    Ok(content) if !content.is_empty() => {
                        self.store(&key, &content).await;
                        return content;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(username, error = %e, "Tweet fetch failed"),
                }
            }
        }

        let mut content = String::new();
        for provider in &self.providers {
            match provider.fetch(&url).await {
                Ok(text) if !text.is_empty() => {
                    content = text;
                    break;
                }
                Ok(_) => {
                    debug!(url = %url, fetcher = provider.name(), "Fetcher returned no content")
                }
                Err(e) => warn!(url = %url, fetcher = provider.name(), error = %e, "Fetcher failed"),
            }
        }

        if !content.is_empty() {
            self.store(&key, &content).await;
        }
        content
    }

    async fn store(&self, key: &str, content: &str) {
        if let Err(e) = self
            .cache
            .set(Namespace::Url, key, content, self.ttl)
            .await
        {
            warn!(error = %e, "Url cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::testing::{MockPageFetcher, MockTweetScraper};

    fn fetcher_with(
        providers: Vec<Arc<dyn PageFetcher>>,
        tweets: Arc<dyn TweetScraper>,
        cache: Arc<dyn CacheStore>,
    ) -> FallbackFetcher {
        FallbackFetcher::new(providers, tweets, cache, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let primary = Arc::new(MockPageFetcher::named("primary").on_page("https://a.dev", "primary content"));
        let backup = Arc::new(MockPageFetcher::named("backup").on_page("https://a.dev", "backup content"));
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![primary.clone(), backup.clone()],
            Arc::new(MockTweetScraper::new()),
            cache,
        );

        let content = fetcher.fetch("https://a.dev").await;
        assert_eq!(content, "primary content");
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_provider_falls_through() {
        // primary has no page registered, so it errors
        let primary = Arc::new(MockPageFetcher::named("primary"));
        let backup = Arc::new(MockPageFetcher::named("backup").on_page("https://a.dev", "backup content"));
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![primary, backup],
            Arc::new(MockTweetScraper::new()),
            cache,
        );

        assert_eq!(fetcher.fetch("https://a.dev").await, "backup content");
    }

    #[tokio::test]
    async fn test_total_failure_yields_empty_and_never_errors() {
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![Arc::new(MockPageFetcher::new())],
            Arc::new(MockTweetScraper::new()),
            cache.clone(),
        );

        assert_eq!(fetcher.fetch("https://nowhere.dev").await, "");
        // Failures are not cached
        let key = keys::url_key("https://nowhere.dev");
        assert_eq!(cache.get(Namespace::Url, &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_linkedin_short_circuits_without_cache_write() {
        let provider = Arc::new(
            MockPageFetcher::new().on_page("https://www.linkedin.com/in/alice", "should not fetch"),
        );
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![provider.clone()],
            Arc::new(MockTweetScraper::new()),
            cache.clone(),
        );

        assert_eq!(fetcher.fetch("https://www.linkedin.com/in/alice").await, "");
        assert_eq!(provider.calls(), 0);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_providers() {
        let provider = Arc::new(MockPageFetcher::new().on_page("https://a.dev", "fresh"));
        let cache = Arc::new(MemoryCacheStore::new());
        let key = keys::url_key("https://a.dev");
        cache
            .set(Namespace::Url, &key, "cached", Duration::from_secs(60))
            .await
            .unwrap();

        let fetcher = fetcher_with(
            vec![provider.clone()],
            Arc::new(MockTweetScraper::new()),
            cache,
        );

        assert_eq!(fetcher.fetch("https://a.dev").await, "cached");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_twitter_profile_uses_tweet_scraper() {
        let provider = Arc::new(MockPageFetcher::new());
        let tweets = Arc::new(MockTweetScraper::new().on_user("alice", "Twitter Profile: @alice"));
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(vec![provider.clone()], tweets, cache);

        let content = fetcher.fetch("https://x.com/alice").await;
        assert_eq!(content, "Twitter Profile: @alice");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_twitter_failure_falls_through_to_providers() {
        // No user registered: tweet scraper errors, generic providers run.
        let provider =
            Arc::new(MockPageFetcher::new().on_page("https://x.com/alice", "generic page"));
        let tweets = Arc::new(MockTweetScraper::new());
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(vec![provider], tweets, cache);

        assert_eq!(fetcher.fetch("https://x.com/alice").await, "generic page");
    }

    #[tokio::test]
    async fn test_schemeless_url_normalized_before_fetch() {
        let provider = Arc::new(MockPageFetcher::new().on_page("https://a.dev", "content"));
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![provider],
            Arc::new(MockTweetScraper::new()),
            cache,
        );

        assert_eq!(fetcher.fetch("a.dev").await, "content");
    }

    #[tokio::test]
    async fn test_successful_fetch_is_cached() {
        let provider = Arc::new(MockPageFetcher::new().on_page("https://a.dev", "content"));
        let cache = Arc::new(MemoryCacheStore::new());
        let fetcher = fetcher_with(
            vec![provider.clone()],
            Arc::new(MockTweetScraper::new()),
            cache,
        );

        assert_eq!(fetcher.fetch("https://a.dev").await, "content");
        assert_eq!(fetcher.fetch("https://a.dev").await, "content");
        assert_eq!(provider.calls(), 1);
    }
}
