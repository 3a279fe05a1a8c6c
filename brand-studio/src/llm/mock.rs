use async_trait::async_trait;
use brand_core::{BrandError, Llm, LlmRequest, LlmResponse, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order and records every request it receives.
///
/// Once the script is exhausted further calls fail with a model error.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    name: String,
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.lock_replies().push_back(Ok(text.into()));
        self
    }

    pub fn with_error(self, error: BrandError) -> Self {
        self.lock_replies().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String>>> {
        self.replies.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_text(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);
        let next = self.lock_replies().pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResponse::text(text)),
            Some(Err(error)) => Err(error),
            None => Err(BrandError::model(format!("{}: script exhausted", self.name))),
        }
    }
}
