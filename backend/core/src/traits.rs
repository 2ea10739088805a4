use anyhow::Result;
use async_trait::async_trait;

use crate::error::FrameResult;
use crate::types::ImageFileType;

/// Trait for text-completion backends used by the enricher.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "ollama", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

/// A connected art-mode display that accepts uploaded images.
///
/// Implemented by the Samsung session in `theframe-tv`; the upload command is
/// written against this trait so it can run against an in-memory display.
#[async_trait]
pub trait ArtDisplay: Send {
    /// Store an image on the display and return the content id it assigned.
    async fn upload(&mut self, image: &[u8], file_type: ImageFileType) -> FrameResult<String>;

    /// Make `content_id` the active artwork; `show` also switches the screen to it.
    async fn set_active(&mut self, content_id: &str, show: bool) -> FrameResult<()>;

    /// Whether art mode is currently on.
    async fn artmode_enabled(&mut self) -> FrameResult<bool>;

    /// Content id of the artwork currently selected, if any.
    async fn current_content(&mut self) -> FrameResult<Option<String>>;

    /// Content ids of user-uploaded artworks stored on the display.
    async fn list_content(&mut self) -> FrameResult<Vec<String>>;

    async fn delete_content(&mut self, content_ids: &[String]) -> FrameResult<()>;
}
