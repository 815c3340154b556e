use std::fmt;
use async_trait::async_trait;
use crate::types::CompletionRequest;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Run a single system + user completion and return the generated text.
    ///
    /// Missing credentials must surface as `Error::Config` so callers can
    /// tell a misconfigured deployment apart from a flaky upstream.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
