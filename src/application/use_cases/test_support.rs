//! Stub generation service shared by pipeline and translator tests.

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::GenerationRequest;
use crate::infrastructure::llm_clients::LLMClient;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type StructuredReply = Box<dyn Fn() -> Result<String> + Send + Sync>;

/// Structured requests get the scripted reply; text requests are treated as
/// translations and echoed back as `[target] text`.
pub struct StubClient {
    structured: StructuredReply,
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl StubClient {
    pub fn responding(raw: &str) -> Self {
        let raw = raw.to_string();
        Self::with_reply(Box::new(move || Ok(raw.clone())))
    }

    pub fn failing(make_error: fn() -> AppError) -> Self {
        Self::with_reply(Box::new(move || Err(make_error())))
    }

    pub fn translator() -> Self {
        Self::with_reply(Box::new(|| {
            Err(AppError::Internal("no structured reply scripted".to_string()))
        }))
    }

    fn with_reply(structured: StructuredReply) -> Self {
        Self {
            structured,
            delays: HashMap::new(),
            failures: HashSet::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay the translation of `text`
    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    /// Fail the translation of `text`
    pub fn with_failure(mut self, text: &str) -> Self {
        self.failures.insert(text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn translation_target(request: &GenerationRequest) -> String {
        request
            .parts
            .first()
            .and_then(|instruction| instruction.split(" to ").nth(1))
            .and_then(|rest| rest.split('.').next())
            .unwrap_or("?")
            .to_string()
    }
}

#[async_trait]
impl LLMClient for StubClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let structured = request
            .config
            .as_ref()
            .map(|config| config.response_schema.is_some())
            .unwrap_or(false);
        if structured {
            return (self.structured)();
        }

        let text = request.parts.last().cloned().unwrap_or_default();
        if let Some(delay) = self.delays.get(&text) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(&text) {
            return Err(AppError::ServiceUnavailable(format!(
                "translation of '{}' failed",
                text
            )));
        }
        Ok(format!("[{}] {}", Self::translation_target(request), text))
    }
}
