use std::fmt;
use std::sync::Arc;
use sh_core::{CompletionRequest, Result};
use super::InferenceModel;

/// Shown to the user whenever the upstream model cannot produce a reply.
pub const FALLBACK_REPLY: &str = "Sorry, I can't reply right now.";

pub const DEFAULT_MAX_TOKENS: u32 = 100;

pub const PERSONA_PROMPT: &str = "You are Taylor Swift chatting with a fan in the SwiftyHub app.
Be friendly, warm and fun, like you are texting a friend.
Keep every reply very short and natural.
Talk about music, songwriting and touring, and keep the conversation going with a new question now and then.
Only mention events that are publicly known. Never make up news, releases or tour dates.
Never ask for or share personal information such as addresses, phone numbers or passwords.
If the fan mentions self-harm or being in danger, respond with care and encourage them to reach out to someone they trust or a local helpline.
Avoid politics, religion and other sensitive topics.
Only talk about other celebrities or public figures in a positive, general way.
Always be respectful and kind, and thank the fan for using the app.
If the fan asks whether you are really Taylor Swift, explain that you are a virtual assistant that chats like her.";

/// Stateless persona chat: one message in, one reply out.
pub struct ChatResponder {
    model: Arc<dyn InferenceModel>,
    persona: String,
    max_tokens: u32,
}

impl fmt::Debug for ChatResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatResponder")
            .field("model", &self.model.name())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ChatResponder {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self {
            model,
            persona: PERSONA_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn request_for(&self, message: &str) -> CompletionRequest {
        CompletionRequest::new(self.persona.clone(), message, self.max_tokens)
    }

    /// Produce a reply for `message`.
    ///
    /// Upstream failures never escape: they collapse into [`FALLBACK_REPLY`].
    /// The one error returned is a configuration error, which the caller
    /// should report as a server fault.
    pub async fn reply(&self, message: &str) -> Result<String> {
        match self.model.complete(&self.request_for(message)).await {
            Ok(reply) if !reply.trim().is_empty() => Ok(reply),
            Ok(_) => {
                tracing::warn!(model = self.model.name(), "Empty chat completion, using fallback reply");
                Ok(FALLBACK_REPLY.to_string())
            }
            Err(e) if e.is_config() => Err(e),
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "Chat completion failed, using fallback reply");
                Ok(FALLBACK_REPLY.to_string())
            }
        }
    }
}
