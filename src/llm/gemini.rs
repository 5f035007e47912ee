use super::{Generation, TextGenerator};
use crate::config::GeminiConfig;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Creates a client; a missing key only fails when a call is made
    pub fn new(config: &GeminiConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self, api_key: &str) -> Result<Url> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        Ok(Url::parse_with_params(&url, &[("key", api_key)])?)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::Config("GEMINI_API_KEY not configured".to_string()))?;

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        debug!("Sending {} prompt characters to {}", prompt.len(), self.model);
        let response = self
            .client
            .post(self.endpoint(api_key)?)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Generation request failed: HTTP {}", status);
            return Ok(Generation::Failed {
                status: status.as_u16(),
                body,
            });
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Generation(format!("Invalid response body: {}", e)))?;

        let text = result["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ServiceError::Generation("Response has no candidates[0].content.parts[0].text".to_string())
            })?;

        Ok(Generation::Text(text.to_string()))
    }
}
