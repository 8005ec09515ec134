mod prompts;

use crate::application::use_cases::prompt_builder::{build_prompt, RecordIds};
use crate::application::use_cases::response_validator::parse_output;
use crate::application::use_cases::sampler::sample_window;
use crate::application::use_cases::translate::TranslateUseCase;
use crate::domain::analysis::{AnalysisResult, Provenance, ResultEnvelope, TaskOutput};
use crate::domain::error::{AppError, Result};
use crate::domain::schema::TaskKind;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::DatasetSource;
use crate::infrastructure::llm_clients::LLMClient;
use crate::shared::token_counter::TokenCounter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub sample_size: usize,
    pub sample_offset: usize,
    pub max_prompt_tokens: usize,
    pub id_column: String,
    pub default_target_language: Option<String>,
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            sample_size: config.sample_size,
            sample_offset: config.sample_offset,
            max_prompt_tokens: config.max_prompt_tokens,
            id_column: config.id_column.clone(),
            default_target_language: config.default_target_language.clone(),
        }
    }
}

/// Per-run overrides
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskRequest {
    #[serde(default, alias = "lang")]
    #[validate(length(max = 64))]
    pub target_language: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Runs one analytical task end to end:
/// load, sample, render, budget check, generate, validate, translate, attach provenance.
pub struct AnalysisUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    source: Arc<dyn DatasetSource + Send + Sync>,
    translator: TranslateUseCase,
    settings: PipelineSettings,
}

impl AnalysisUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        source: Arc<dyn DatasetSource + Send + Sync>,
        translator: TranslateUseCase,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm_client,
            source,
            translator,
            settings,
        }
    }

    pub async fn execute<T: TaskOutput>(&self, request: &TaskRequest) -> Result<ResultEnvelope<T>> {
        let task = T::TASK;
        let dataset = self.source.load()?;

        let offset = request.offset.unwrap_or(self.settings.sample_offset);
        let limit = request.limit.unwrap_or(self.settings.sample_size);
        let sample = sample_window(&dataset, offset, limit);
        if sample.is_empty() {
            return Err(AppError::EmptyDataset(format!(
                "no records in window offset={} limit={} (dataset has {} records)",
                offset,
                limit,
                dataset.len()
            )));
        }

        let ids =
            (task == TaskKind::SentimentScores).then(|| sample.record_ids(&self.settings.id_column));
        let payload = build_prompt(
            task,
            &prompts::instruction(task),
            &sample,
            ids.as_deref().map(|values| RecordIds {
                column: &self.settings.id_column,
                values,
            }),
            dataset.len(),
        );

        let estimated_cost = TokenCounter::check_budget(
            &payload.text(),
            self.settings.max_prompt_tokens,
            sample.column_count(),
            sample.len(),
        )?;

        info!(
            task = %task,
            source = %self.source.describe(),
            full_rows = dataset.len(),
            sampled_rows = sample.len(),
            offset = sample.offset,
            estimated_tokens = estimated_cost,
            "Requesting structured analysis"
        );

        let raw = self
            .llm_client
            .generate(&payload.to_request(&self.settings.model))
            .await?;
        let mut output: T = parse_output(&raw, payload.schema)?;
        output.reconcile(ids.as_deref().unwrap_or_default(), &raw)?;

        let metadata = Provenance {
            full_record_count: dataset.len(),
            sampled_record_count: sample.len(),
            estimated_cost,
        };

        let target = request
            .target_language
            .as_deref()
            .or(self.settings.default_target_language.as_deref());
        let Some(target_language) = self.translator.effective_target(target) else {
            return Ok(ResultEnvelope::Native(AnalysisResult {
                payload: output,
                metadata,
            }));
        };

        let fields = output.text_fields();
        if !fields.is_empty() {
            info!(
                task = %task,
                target_language = %target_language,
                fields = fields.len(),
                "Translating result fields"
            );
            let translated = self
                .translator
                .translate_fields(fields, Some(&target_language))
                .await;
            output.apply_translations(translated);
        }

        Ok(ResultEnvelope::Translated {
            target_language,
            result: AnalysisResult {
                payload: output,
                metadata,
            },
        })
    }
}
