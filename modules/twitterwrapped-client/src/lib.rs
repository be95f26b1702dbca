pub mod error;
pub mod types;

pub use error::{Result, TwitterWrappedError};
pub use types::{Tweet, TweetArchive};

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://twitterwrapped.exa.ai";

// The service rejects plain API clients, so requests carry browser headers.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:147.0) Gecko/20100101 Firefox/147.0";

pub struct TwitterWrappedClient {
    client: reqwest::Client,
    base_url: String,
}

impl TwitterWrappedClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch a user's tweet archive. Tries the live fetch endpoint first and
    /// falls back to the dynamodb snapshot endpoint when it yields nothing.
    /// Errors only when both endpoints come back empty or broken.
    pub async fn fetch_tweets(&self, username: &str) -> Result<TweetArchive> {
        if let Some(data) = self.try_endpoint("/api/twitter-fetch", username).await {
            return Ok(TweetArchive::from_response(username, data));
        }

        debug!(username, "twitter-fetch empty, trying dynamodb-tweets");
        if let Some(data) = self.try_endpoint("/api/dynamodb-tweets", username).await {
            return Ok(TweetArchive::from_response(username, data));
        }

        Err(TwitterWrappedError::NoData {
            username: username.to_string(),
        })
    }

    async fn try_endpoint(&self, path: &str, username: &str) -> Option<Value> {
        match self.post_username(path, username).await {
            Ok(data) if has_payload(&data) => Some(data),
            Ok(_) => None,
            Err(e) => {
                debug!(username, path, error = %e, "endpoint failed");
                None
            }
        }
    }

    async fn post_username(&self, path: &str, username: &str) -> Result<Value> {
        let endpoint = format!("{}{}", self.base_url, path);
        let body = serde_json::json!({ "username": username });

        let resp = self
            .client
            .post(&endpoint)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Content-Type", "application/json")
            .header("Origin", &self.base_url)
            .header("Referer", format!("{}/", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TwitterWrappedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.json().await?)
    }
}

impl Default for TwitterWrappedClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A response is usable when any payload key is present and non-empty.
fn has_payload(data: &Value) -> bool {
    ["tweets", "searchResults", "data"]
        .iter()
        .any(|key| is_non_empty(data.get(key)))
}

fn is_non_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
    }
}
