use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use signlens_contracts::analysis::AnalysisResult;
use signlens_contracts::chat::ChatMessage;
use signlens_contracts::media::MediaAsset;
use signlens_contracts::models::ModelSpec;
use signlens_contracts::prompt::{analysis_response_schema, chat_prompt, ANALYSIS_INSTRUCTIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    InlineData { mime_type: String, data: String },
    Text(String),
}

/// One transport-neutral multimodal request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: ModelSpec,
    pub parts: Vec<RequestPart>,
    pub response_schema: Option<Value>,
    pub timeout: Duration,
}

impl ModelRequest {
    pub fn expects_json(&self) -> bool {
        self.response_schema.is_some()
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                RequestPart::Text(text) => Some(text.as_str()),
                RequestPart::InlineData { .. } => None,
            })
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

/// Base64-encodes the full media payload. Chat turns call this again every
/// time; no upload handle is kept between requests.
pub fn media_part(media: &MediaAsset) -> RequestPart {
    RequestPart::InlineData {
        mime_type: media.mime_type().to_string(),
        data: BASE64.encode(media.bytes()),
    }
}

pub fn build_analysis_request(
    media: &MediaAsset,
    model: ModelSpec,
    timeout: Duration,
) -> ModelRequest {
    ModelRequest {
        model,
        parts: vec![
            media_part(media),
            RequestPart::Text(ANALYSIS_INSTRUCTIONS.to_string()),
        ],
        response_schema: Some(analysis_response_schema()),
        timeout,
    }
}

pub fn build_chat_request(
    media: &MediaAsset,
    model: ModelSpec,
    result: Option<&AnalysisResult>,
    history: &[ChatMessage],
    question: &str,
    timeout: Duration,
) -> ModelRequest {
    ModelRequest {
        model,
        parts: vec![
            media_part(media),
            RequestPart::Text(chat_prompt(result, history, question)),
        ],
        response_schema: None,
        timeout,
    }
}
