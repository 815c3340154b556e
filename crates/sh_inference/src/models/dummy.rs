use std::fmt;
use std::sync::Mutex;
use sh_core::{CompletionRequest, Result};
use super::InferenceModel;

type Responder = dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync;

/// Offline model. Echoes the first words of the prompt unless given a
/// responder, and records every request it sees.
pub struct DummyModel {
    responder: Option<Box<Responder>>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("scripted", &self.responder.is_some())
            .finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self {
            responder: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        match &self.responder {
            Some(responder) => responder(request),
            None => {
                let words: Vec<&str> = request.user_message.split_whitespace().take(20).collect();
                Ok(words.join(" "))
            }
        }
    }
}
