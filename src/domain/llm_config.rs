use serde::{Deserialize, Serialize};

use crate::domain::schema::SchemaContract;

pub const JSON_MIME_TYPE: &str = "application/json";

/// Temperature used for analytical extraction.
pub const ANALYTICAL_TEMPERATURE: f32 = 0.0;

/// Temperature used for free-text translation.
pub const TRANSLATION_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub response_mime_type: Option<String>,
    pub response_schema: Option<&'static SchemaContract>,
    pub temperature: f32,
}

/// One call to the generation service
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    /// Plain text content parts, sent in order
    pub parts: Vec<String>,
    pub config: Option<GenerationConfig>,
}

impl GenerationRequest {
    /// Schema-constrained JSON request at the lowest exploration setting.
    pub fn structured(model: &str, parts: Vec<String>, schema: &'static SchemaContract) -> Self {
        Self {
            model: model.to_string(),
            parts,
            config: Some(GenerationConfig {
                response_mime_type: Some(JSON_MIME_TYPE.to_string()),
                response_schema: Some(schema),
                temperature: ANALYTICAL_TEMPERATURE,
            }),
        }
    }

    pub fn text(model: &str, parts: Vec<String>, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            parts,
            config: Some(GenerationConfig {
                response_mime_type: None,
                response_schema: None,
                temperature,
            }),
        }
    }

    pub fn prompt_text(&self) -> String {
        self.parts.join("\n\n")
    }
}
