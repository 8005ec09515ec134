use super::LLMClient;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{GenerationRequest, LLMConfig};
use crate::domain::schema::{SchemaContract, SchemaKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct GeminiErrorEnvelope {
    #[serde(default)]
    error: GeminiErrorDetail,
}

#[derive(Deserialize, Default)]
struct GeminiErrorDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// Split a 400 reply into credential problems and rejected requests.
fn classify_bad_request(body: &str) -> AppError {
    let detail = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .unwrap_or_default();
    let status = if detail.status.is_empty() {
        "INVALID_ARGUMENT"
    } else {
        detail.status.as_str()
    };
    let message = if detail.message.is_empty() {
        body.trim()
    } else {
        detail.message.as_str()
    };

    let credential_problem = matches!(status, "UNAUTHENTICATED" | "PERMISSION_DENIED")
        || message.to_ascii_lowercase().contains("api key");
    if credential_problem {
        AppError::ServiceUnavailable(format!("API error (400 {}): {}", status, message))
    } else {
        AppError::SchemaRejected(format!("{}: {}", status, message))
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: LLMConfig,
}

impl GeminiClient {
    pub fn new(config: LLMConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::ServiceUnavailable("Missing API key for generation service".to_string())
            })
    }

    fn build_body(&self, request: &GenerationRequest) -> GeminiRequest {
        let parts = request
            .parts
            .iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| GeminiPart { text: part.clone() })
            .collect();

        GeminiRequest {
            contents: vec![GeminiContent { parts, role: None }],
            generation_config: request.config.as_ref().map(|config| GenerationConfig {
                temperature: config.temperature as f64,
                max_output_tokens: self.config.max_tokens,
                response_mime_type: config.response_mime_type.clone(),
                response_schema: config.response_schema.map(to_gemini_schema),
            }),
        }
    }
}

/// Render a schema contract in the service's OpenAPI-style dialect.
pub fn to_gemini_schema(schema: &SchemaContract) -> Value {
    let mut out = Map::new();
    out.insert(
        "type".to_string(),
        Value::String(schema.type_name().to_ascii_uppercase()),
    );
    if let Some(description) = &schema.description {
        out.insert("description".to_string(), json!(description));
    }
    match &schema.kind {
        SchemaKind::Array(items) => {
            out.insert("items".to_string(), to_gemini_schema(items));
        }
        SchemaKind::Object(object) => {
            let properties: Map<String, Value> = object
                .properties
                .iter()
                .map(|(name, property)| (name.clone(), to_gemini_schema(property)))
                .collect();
            let ordering: Vec<&str> = object.properties.iter().map(|(n, _)| n.as_str()).collect();
            out.insert("properties".to_string(), Value::Object(properties));
            out.insert("required".to_string(), json!(object.required));
            out.insert("propertyOrdering".to_string(), json!(ordering));
        }
        _ => {}
    }
    Value::Object(out)
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self.api_key()?;
        let model_id = request.model.trim();
        let base_url = self.config.base_url.trim_end_matches('/');
        let url = format!("{}/{}:generateContent", base_url, model_id);

        let body = self.build_body(request);

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_bad_request(&text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ServiceUnavailable(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let json: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("Failed to parse JSON: {}", e)))?;

        let text: String = json
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::EmptyOutput);
        }
        Ok(text)
    }
}
