pub mod gemini;

use crate::domain::error::Result;
use crate::domain::llm_config::GenerationRequest;
use async_trait::async_trait;

pub use gemini::GeminiClient;

/// Capability contract of the external generation service.
///
/// Implementations return the raw output text. Transport and service failures
/// are surfaced as errors and never retried.
#[async_trait]
pub trait LLMClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}
