use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use dossier_common::Config;
use dossier_enrich::cache::PgCacheStore;
use dossier_enrich::fetch::FallbackFetcher;
use dossier_enrich::providers::{
    ExaFetcher, FirecrawlFetcher, FirecrawlSearcher, NoopSocialScraper, PageFetcher, SocialScraper,
    TweetScraper, TwitterWrappedScraper, WebSearcher,
};
use dossier_enrich::search::SearchAggregator;
use dossier_enrich::synth::{GeminiSynthesizer, Synthesizer};
use dossier_enrich::{CacheStore, EnrichDeps, JobManager};

mod rest;

pub struct AppState {
    pub cache: Arc<dyn CacheStore>,
    pub jobs: JobManager,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("dossier_api=info".parse()?)
                .add_directive("dossier_enrich=info".parse()?),
        )
        .init();

    let config = Config::from_env();
    if config.job_ttl_secs >= config.cache_ttl_secs {
        warn!("JOB_TTL is not shorter than CACHE_TTL, job records may outlive their results");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgCacheStore::new(pool));
    store.migrate().await?;
    info!("Connected to database, migrations complete");

    // Hourly sweep of expired cache rows.
    let evictor = store.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(3600));
        loop {
            ticker.tick().await;
            match evictor.evict_expired().await {
                Ok(0) => {}
                Ok(rows) => info!(rows, "Evicted expired cache entries"),
                Err(e) => warn!(error = %e, "Cache eviction sweep failed"),
            }
        }
    });

    let cache: Arc<dyn CacheStore> = store;
    let cache_ttl = Duration::from_secs(config.cache_ttl_secs);
    let job_ttl = Duration::from_secs(config.job_ttl_secs);

    let providers: Vec<Arc<dyn PageFetcher>> = vec![
        Arc::new(FirecrawlFetcher::new(config.firecrawl_api_key.clone())),
        Arc::new(ExaFetcher::new(config.exa_api_key.clone())),
    ];
    let tweets: Arc<dyn TweetScraper> = Arc::new(TwitterWrappedScraper::new());
    let fetcher = Arc::new(FallbackFetcher::new(
        providers,
        tweets,
        cache.clone(),
        cache_ttl,
    ));

    let searcher: Arc<dyn WebSearcher> =
        Arc::new(FirecrawlSearcher::new(config.firecrawl_api_key.clone()));
    let aggregator = Arc::new(SearchAggregator::new(searcher, cache.clone(), cache_ttl));

    let synthesizer: Arc<dyn Synthesizer> = Arc::new(GeminiSynthesizer::new(Gemini::new(
        &config.gemini_api_key,
        &config.gemini_model,
    )));
    let social: Arc<dyn SocialScraper> = Arc::new(NoopSocialScraper);

    let deps = EnrichDeps::new(cache.clone(), fetcher, aggregator, synthesizer, social);
    let jobs = JobManager::new(cache.clone(), deps, job_ttl, cache_ttl);

    let state = Arc::new(AppState { cache, jobs });

    let app = Router::new()
        // Liveness
        .route("/", get(|| async { "ok" }))
        .route("/health", get(rest::api_health))
        // Profile API
        .route("/api/process-profile", post(rest::profile::api_process_profile))
        .route("/api/profile-status/{job_id}", get(rest::api_profile_status))
        .route("/api/cache/clear", post(rest::profile::api_cache_clear))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Dossier API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
