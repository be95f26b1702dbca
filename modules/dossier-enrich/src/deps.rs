use std::sync::Arc;

use crate::cache::CacheStore;
use crate::fetch::FallbackFetcher;
use crate::providers::SocialScraper;
use crate::search::SearchAggregator;
use crate::synth::Synthesizer;

/// Central dependency container passed to the pipeline and job manager.
/// Everything is injected at construction; nothing reads the process
/// environment past startup.
#[derive(Clone)]
pub struct EnrichDeps {
    pub cache: Arc<dyn CacheStore>,
    pub fetcher: Arc<FallbackFetcher>,
    pub aggregator: Arc<SearchAggregator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub social: Arc<dyn SocialScraper>,
}

impl EnrichDeps {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        fetcher: Arc<FallbackFetcher>,
        aggregator: Arc<SearchAggregator>,
        synthesizer: Arc<dyn Synthesizer>,
        social: Arc<dyn SocialScraper>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            aggregator,
            synthesizer,
            social,
        }
    }
}
