use crate::domain::llm_config::{GenerationRequest, TRANSLATION_TEMPERATURE};
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::clean_llm_response;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Best-effort translation of result text fields.
///
/// Output is positionally aligned with input. A failed field keeps its
/// original text; nothing here ever fails the surrounding task.
pub struct TranslateUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    model: String,
    native_language: String,
    max_concurrency: usize,
}

impl TranslateUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        model: String,
        native_language: String,
        max_concurrency: usize,
    ) -> Self {
        Self {
            llm_client,
            model,
            native_language,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// The language to translate into, or `None` when translation is a no-op.
    pub fn effective_target(&self, target: Option<&str>) -> Option<String> {
        let target = target.map(str::trim).filter(|t| !t.is_empty())?;
        if target.eq_ignore_ascii_case(self.native_language.trim()) {
            return None;
        }
        Some(target.to_string())
    }

    pub async fn translate_fields(&self, fields: Vec<String>, target: Option<&str>) -> Vec<String> {
        let Some(target) = self.effective_target(target) else {
            return fields;
        };

        let mut results: Vec<(usize, String)> = stream::iter(fields.into_iter().enumerate())
            .map(|(index, text)| {
                let target = target.as_str();
                async move { (index, self.translate_one(text, target).await) }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, text)| text).collect()
    }

    async fn translate_one(&self, text: String, target: &str) -> String {
        if text.trim().is_empty() {
            return text;
        }

        let system_prompt = format!(
            "You are a professional translator. Translate the following text from {} to {}. Return ONLY the translated text. Do not include any explanations, notes, or quotation marks around the output unless they are in the original text.",
            self.native_language, target
        );
        let request = GenerationRequest::text(
            &self.model,
            vec![system_prompt, text.clone()],
            TRANSLATION_TEMPERATURE,
        );

        match self.llm_client.generate(&request).await {
            Ok(raw) => {
                let translated = clean_llm_response(&raw);
                if translated.is_empty() {
                    warn!(target_language = %target, "Empty translation, keeping original text");
                    text
                } else {
                    debug!(target_language = %target, chars = translated.len(), "Translated field");
                    translated
                }
            }
            Err(err) => {
                warn!(error = %err, target_language = %target, "Translation failed, keeping original text");
                text
            }
        }
    }
}
