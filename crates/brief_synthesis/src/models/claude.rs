//! Anthropic messages API client for the `LanguageModel` seam.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use brief_core::{Error, LanguageModel, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Tagged at the adapter boundary: success payload, recognized error, or
/// (via the serde failure) an unrecognized shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessagesResponse {
    Success { content: Vec<ContentBlock> },
    ApiError { error: ApiError },
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

pub struct ClaudeModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeModel {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Model("Anthropic API key is required".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl fmt::Debug for ClaudeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeModel")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl LanguageModel for ClaudeModel {
    fn name(&self) -> &str {
        "Claude"
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let body = response.bytes().await?;
        let parsed: MessagesResponse = serde_json::from_slice(&body)
            .map_err(|e| Error::Model(format!("unrecognized model response shape: {}", e)))?;

        match parsed {
            MessagesResponse::Success { content } => content
                .into_iter()
                .find(|block| block.kind == "text")
                .and_then(|block| block.text)
                .ok_or_else(|| Error::Model("response contained no text block".to_string())),
            MessagesResponse::ApiError { error } => Err(Error::Model(format!(
                "model API error ({}): {}",
                error.kind, error.message
            ))),
        }
    }
}
