use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use theframe_core::{LlmProvider, LlmRequest, LlmResponse};

/// A mock LLM provider that returns canned or scripted responses.
///
/// Scripted replies are consumed in order; once they run out the fixed
/// response (or a generic one) is returned.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Queue a successful reply.
    pub fn then_reply(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    /// Queue a failure, as if the endpoint were down.
    pub fn then_fail(self, error: impl Into<String>) -> Self {
        self.push(Err(error.into()));
        self
    }

    fn push(&self, entry: Result<String, String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let content = match next {
            Some(Ok(content)) => content,
            Some(Err(error)) => anyhow::bail!(error),
            None => self.fixed_response.clone().unwrap_or_else(|| "Mock response".to_string()),
        };

        Ok(LlmResponse {
            content,
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}
