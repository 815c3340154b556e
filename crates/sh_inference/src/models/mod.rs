use std::sync::Arc;
use std::fmt;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sh_core::{CompletionRequest, Error, Result};
use crate::Config;

pub mod dummy;

pub use sh_core::InferenceModel;
pub use dummy::DummyModel;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

// Every level is optional: a body that parses but lacks
// `choices[0].message.content` is a failed completion, not a decode error.
#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAiModel {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: String,
    model_name: String,
}

impl OpenAiModel {
    pub fn new(config: &Config) -> Result<Self> {
        url::Url::parse(config.base_url())
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", config.base_url(), e)))?;
        Ok(Self {
            client: Arc::new(Client::new()),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url().to_string(),
            model_name: config.model_name().to_string(),
        })
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        ChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_message.clone(),
                },
            ],
            max_tokens: request.max_tokens,
        }
    }
}

impl fmt::Debug for OpenAiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| Error::Inference("completion response contained no choices".to_string()))
}

fn upstream_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}

#[async_trait]
impl InferenceModel for OpenAiModel {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OpenAI API key is missing".to_string()))?;

        tracing::debug!(model = %self.model_name, max_tokens = request.max_tokens, "Requesting completion");
        let response = self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&self.build_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "completion request failed with {}: {}",
                status,
                upstream_error_message(&body)
            )));
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Inference(format!("malformed completion response: {}", e)))?;
        extract_content(body)
    }
}

pub fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiModel::new(&config)?)),
        "dummy" => Ok(Arc::new(DummyModel::new())),
        other => Err(Error::Config(format!(
            "Unknown inference provider '{}'. Available providers: openai, dummy",
            other
        ))),
    }
}
