use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // AI provider
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Content providers
    pub firecrawl_api_key: String,
    pub exa_api_key: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Cache lifetimes (seconds)
    pub cache_ttl_secs: u64,
    pub job_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            firecrawl_api_key: required_env("FIRECRAWL_API_KEY"),
            exa_api_key: required_env("EXA_API_KEY"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
            cache_ttl_secs: env::var("CACHE_TTL")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()
                .expect("CACHE_TTL must be a number of seconds"),
            job_ttl_secs: env::var("JOB_TTL")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .expect("JOB_TTL must be a number of seconds"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
