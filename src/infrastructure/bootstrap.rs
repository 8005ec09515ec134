use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::{error, info};

use crate::application::{AnalysisUseCase, PipelineSettings, TranslateUseCase};
use crate::domain::error::Result;
use crate::domain::schema;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::CsvDatasetSource;
use crate::infrastructure::llm_clients::{GeminiClient, LLMClient};
use crate::interfaces::http::{add_log, LogEntry};

static GENERATION_CLIENT: OnceCell<Arc<GeminiClient>> = OnceCell::new();

/// Shared state behind every route
pub struct AppState {
    pub analysis: AnalysisUseCase,
}

/// Process-wide generation client, created on first use.
pub fn generation_client(config: &AppConfig) -> Arc<GeminiClient> {
    GENERATION_CLIENT
        .get_or_init(|| Arc::new(GeminiClient::new(config.llm_config())))
        .clone()
}

pub fn build_state(config: &AppConfig, logs: &Arc<Mutex<Vec<LogEntry>>>) -> Result<AppState> {
    schema::validate_all().map_err(|err| {
        error!(error = %err, "Schema contract check failed");
        err
    })?;

    let llm_client: Arc<dyn LLMClient + Send + Sync> = generation_client(config);
    let translator = TranslateUseCase::new(
        llm_client.clone(),
        config.model.clone(),
        config.native_language.clone(),
        config.translation_concurrency,
    );
    let source = Arc::new(CsvDatasetSource::new(&config.dataset_path));
    let analysis = AnalysisUseCase::new(
        llm_client,
        source,
        translator,
        PipelineSettings::from(config),
    );

    info!(
        model = %config.model,
        dataset = %config.dataset_path,
        sample_size = config.sample_size,
        max_prompt_tokens = config.max_prompt_tokens,
        "Pipeline ready"
    );
    add_log(
        logs,
        "INFO",
        "Bootstrap",
        &format!(
            "Pipeline ready (model={} dataset={})",
            config.model, config.dataset_path
        ),
    );

    Ok(AppState { analysis })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            api_key: Some("test-key".to_string()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_generation_client_is_shared() {
        let config = config();
        let first = generation_client(&config);
        let second = generation_client(&config);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_build_state_records_startup_log() {
        let logs = Arc::new(Mutex::new(Vec::new()));
        build_state(&config(), &logs).unwrap();

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].source, "Bootstrap");
        assert!(logs[0].message.contains("gemini-2.0-flash"));
    }
}
