use std::fmt;
use std::sync::Arc;
use sh_core::{CompletionRequest, Error, Result};
use super::InferenceModel;

pub const JOURNALIST_PROMPT: &str = "You are a journalist providing concise, fact-based news. \
Do not include fictional or speculative content. \
Do not mention the source or the name of the publisher.";

pub const HEADLINE_EDITOR_PROMPT: &str = "You are a headline editor for an entertainment news app. \
Rewrite the headline you are given so it is short and engaging. \
You must preserve its factual accuracy: do not add, drop or change any fact. \
Reply with the headline only.";

/// Placeholder some deployments return instead of an error.
pub const UNAVAILABLE_SENTINEL: &str = "AI content unavailable";

pub const DEFAULT_BODY_MAX_TOKENS: u32 = 200;
pub const DEFAULT_TITLE_MAX_TOKENS: u32 = 50;

const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('\u{201C}', '\u{201D}'),
    ('\u{2018}', '\u{2019}'),
];

/// The headline without one pair of quotes around all of it. The pair only
/// counts as wrapping when neither of its characters appears inside.
fn unwrap_quotes(headline: &str) -> Option<&str> {
    let mut chars = headline.chars();
    let (first, last) = (chars.next()?, chars.next_back()?);
    let inner = chars.as_str();
    QUOTE_PAIRS
        .iter()
        .find(|&&(open, close)| open == first && close == last)
        .filter(|&&(open, close)| !inner.contains(open) && !inner.contains(close))
        .map(|_| inner.trim())
}

/// Trim whitespace and any quote characters wrapping the whole headline.
pub fn clean_headline(raw: &str) -> String {
    let mut headline = raw.trim();
    while let Some(inner) = unwrap_quotes(headline) {
        headline = inner;
    }
    headline.to_string()
}

/// Writes article bodies and headlines. The two calls are independent so
/// callers can apply a different fallback policy to each.
pub struct ArticleWriter {
    model: Arc<dyn InferenceModel>,
    body_max_tokens: u32,
    title_max_tokens: u32,
}

impl fmt::Debug for ArticleWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticleWriter")
            .field("model", &self.model.name())
            .field("body_max_tokens", &self.body_max_tokens)
            .field("title_max_tokens", &self.title_max_tokens)
            .finish()
    }
}

impl ArticleWriter {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self {
            model,
            body_max_tokens: DEFAULT_BODY_MAX_TOKENS,
            title_max_tokens: DEFAULT_TITLE_MAX_TOKENS,
        }
    }

    pub fn with_token_limits(mut self, body_max_tokens: u32, title_max_tokens: u32) -> Self {
        self.body_max_tokens = body_max_tokens;
        self.title_max_tokens = title_max_tokens;
        self
    }

    pub fn body_request(&self, headline: &str, source_url: &str) -> CompletionRequest {
        CompletionRequest::new(
            JOURNALIST_PROMPT,
            format!(
                "Write a short online article based on the following headline and source:\n\nHeadline: '{}'\n\nURL: {}",
                headline, source_url
            ),
            self.body_max_tokens,
        )
    }

    pub fn headline_request(&self, headline: &str) -> CompletionRequest {
        CompletionRequest::new(
            HEADLINE_EDITOR_PROMPT,
            format!("Rewrite this headline: '{}'", headline),
            self.title_max_tokens,
        )
    }

    /// Generate the article body. Empty or placeholder output is an error.
    pub async fn write_body(&self, headline: &str, source_url: &str) -> Result<String> {
        let content = self
            .model
            .complete(&self.body_request(headline, source_url))
            .await?;
        let content = content.trim();
        if content.is_empty() || content == UNAVAILABLE_SENTINEL {
            return Err(Error::Inference(UNAVAILABLE_SENTINEL.to_string()));
        }
        Ok(content.to_string())
    }

    /// Rewrite a headline, returning it cleaned of wrapping quotes.
    pub async fn rewrite_headline(&self, headline: &str) -> Result<String> {
        let rewritten = self.model.complete(&self.headline_request(headline)).await?;
        let rewritten = clean_headline(&rewritten);
        if rewritten.is_empty() {
            return Err(Error::Inference("headline rewrite was empty".to_string()));
        }
        Ok(rewritten)
    }
}
