use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;

pub const DEFAULT_CONFIG_FILE: &str = "tabsight.toml";
pub const ENV_PREFIX: &str = "TABSIGHT_";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Generation service credential
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(length(min = 1))]
    pub base_url: String,

    pub dataset_path: String,
    /// Column used to identify records for per-record scoring
    pub id_column: String,

    #[validate(range(min = 1, max = 1000))]
    pub sample_size: usize,
    pub sample_offset: usize,
    /// Budget ceiling in estimated tokens
    #[validate(range(min = 1))]
    pub max_prompt_tokens: usize,

    #[validate(length(min = 1))]
    pub native_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_target_language: Option<String>,
    #[validate(range(min = 1, max = 32))]
    pub translation_concurrency: usize,

    pub host: String,
    pub port: u16,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm = LLMConfig::default();
        Self {
            api_key: None,
            model: llm.model,
            base_url: llm.base_url,
            dataset_path: "data/dataset.csv".to_string(),
            id_column: "id".to_string(),
            sample_size: 100,
            sample_offset: 0,
            max_prompt_tokens: 30_000,
            native_language: "en".to_string(),
            default_target_language: None,
            translation_concurrency: 4,
            host: "127.0.0.1".to_string(),
            port: 3001,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `TABSIGHT_*` variables, then `GEMINI_API_KEY`.
    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(
                Env::raw()
                    .only(&["GEMINI_API_KEY"])
                    .map(|_| "api_key".into()),
            )
    }

    pub fn load(path: &str) -> Result<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Field validation plus the credential requirement
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|e| AppError::ValidationError(e.to_string()))?;
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(AppError::ValidationError(
                "api_key is required (set GEMINI_API_KEY or TABSIGHT_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn llm_config(&self) -> LLMConfig {
        LLMConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            max_tokens: None,
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_with_env_key() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("GEMINI_API_KEY", "secret");
            let config = AppConfig::load("missing.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.api_key.as_deref(), Some("secret"));
            assert_eq!(config.sample_size, 100);
            assert_eq!(config.port, 3001);
            assert_eq!(config.native_language, "en");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_override() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file(
                "tabsight.toml",
                r#"
api_key = "from-file"
dataset_path = "tweets.csv"
sample_size = 50
default_target_language = "id"
"#,
            )?;
            jail.set_env("TABSIGHT_SAMPLE_SIZE", "25");

            let config = AppConfig::load(DEFAULT_CONFIG_FILE).map_err(|e| e.to_string())?;
            assert_eq!(config.api_key.as_deref(), Some("from-file"));
            assert_eq!(config.dataset_path, "tweets.csv");
            assert_eq!(config.sample_size, 25);
            assert_eq!(config.default_target_language.as_deref(), Some("id"));
            Ok(())
        });
    }

    #[test]
    fn test_missing_api_key_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let err = AppConfig::load("missing.toml").unwrap_err();
            assert_eq!(err.code(), "validation_error");
            Ok(())
        });
    }

    #[test]
    fn test_zero_sample_size_rejected() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("TABSIGHT_API_KEY", "k");
            jail.set_env("TABSIGHT_SAMPLE_SIZE", "0");
            assert!(AppConfig::load("missing.toml").is_err());
            Ok(())
        });
    }
}
