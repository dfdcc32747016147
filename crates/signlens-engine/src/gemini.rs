use std::env;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};

use crate::errors::truncate_text;
use crate::request::{ModelRequest, RequestPart};
use crate::{ModelTransport, TransportReply};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `generateContent` over blocking HTTP. One call per `generate`, no retries.
pub struct GeminiTransport {
    api_base: String,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new() -> Self {
        Self::with_api_base(
            env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE),
        )
    }

    pub fn with_api_base(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http: HttpClient::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn build_payload(request: &ModelRequest) -> Value {
        let parts: Vec<Value> = request
            .parts
            .iter()
            .map(|part| match part {
                RequestPart::InlineData { mime_type, data } => json!({
                    "inlineData": {
                        "mimeType": mime_type,
                        "data": data,
                    }
                }),
                RequestPart::Text(text) => json!({ "text": text }),
            })
            .collect();

        let mut generation_config = Map::new();
        if let Some(schema) = request.response_schema.as_ref() {
            generation_config.insert(
                "responseMimeType".to_string(),
                Value::String("application/json".to_string()),
            );
            generation_config.insert("responseSchema".to_string(), schema.clone());
        }
        if let Some(budget) = request.model.thinking_budget {
            generation_config.insert(
                "thinkingConfig".to_string(),
                json!({ "thinkingBudget": budget }),
            );
        }

        let mut payload = Map::new();
        payload.insert(
            "contents".to_string(),
            Value::Array(vec![json!({
                "role": "user",
                "parts": parts,
            })]),
        );
        if !generation_config.is_empty() {
            payload.insert(
                "generationConfig".to_string(),
                Value::Object(generation_config),
            );
        }
        Value::Object(payload)
    }

    /// Concatenates the first candidate's text parts, skipping thought parts.
    fn extract_text(response_payload: &Value) -> Option<String> {
        let parts = response_payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)?;
        let text = parts
            .iter()
            .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl Default for GeminiTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, api_key: &str, request: &ModelRequest) -> Result<TransportReply> {
        let endpoint = self.endpoint_for_model(&request.model.name);
        let payload = Self::build_payload(request);

        let response = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key)
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("Gemini request failed ({endpoint})"))?;
        let response_payload = response_json_or_error("Gemini", response)?;

        if let Some(reason) = response_payload
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
        {
            bail!("Gemini blocked the request: {reason}");
        }

        Ok(TransportReply {
            text: Self::extract_text(&response_payload),
            model: response_payload
                .get("modelVersion")
                .and_then(Value::as_str)
                .unwrap_or(request.model.name.as_str())
                .to_string(),
            usage: response_payload
                .get("usageMetadata")
                .cloned()
                .unwrap_or(Value::Null),
        })
    }
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .map_err(reqwest::Error::without_url)
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}
