mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::schema::StructuredOutput;
use crate::util::strip_code_blocks;
use client::GeminiClient;
use types::GenerateRequest;

// =============================================================================
// Gemini Agent
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> GeminiClient {
        let client = GeminiClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Free-form text completion.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest::user(prompt);
        let response = self.client().generate(&self.model, &request).await?;

        response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))
    }

    /// JSON-mode completion: the model is constrained to emit a JSON document.
    pub async fn generate_json(&self, prompt: &str) -> Result<Value> {
        let request = GenerateRequest::user(prompt).json_output();
        let response = self.client().generate(&self.model, &request).await?;

        let text = response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))?;
        serde_json::from_str(strip_code_blocks(&text))
            .map_err(|e| anyhow!("Gemini returned invalid JSON: {}", e))
    }

    /// Structured extraction constrained by the target type's schema.
    pub async fn extract<T: StructuredOutput>(&self, prompt: &str) -> Result<T> {
        let request = GenerateRequest::user(prompt).with_schema(T::gemini_schema());
        let response = self.client().generate(&self.model, &request).await?;

        let text = response
            .text()
            .ok_or_else(|| anyhow!("No text in Gemini response"))?;
        serde_json::from_str(strip_code_blocks(&text))
            .map_err(|e| anyhow!("Failed to deserialize response: {}", e))
    }
}
