use std::fmt;

pub mod models;
pub mod writer;
pub mod chat;

pub use sh_core::InferenceModel;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL_NAME: &str = "gpt-4";

#[derive(Clone)]
pub struct Config {
    /// Which client to build: `openai` or `dummy`
    pub provider: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub base_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: None,
            model_name: None,
            base_url: None,
        }
    }
}

impl Config {
    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL_NAME)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use super::chat::{ChatResponder, FALLBACK_REPLY};
    pub use super::writer::ArticleWriter;
    pub use sh_core::{CompletionRequest, Error, InferenceModel, Result};
}

pub use chat::ChatResponder;
pub use models::create_model;
pub use writer::ArticleWriter;
