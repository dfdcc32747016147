use std::collections::HashMap;
use std::env;
use std::time::{Duration, Instant};

use serde_json::Value;
use signlens_contracts::analysis::{parse_analysis_text, AnalysisResult};
use signlens_contracts::chat::ChatMessage;
use signlens_contracts::media::MediaAsset;
use signlens_contracts::models::{ModelSelector, ModelSpec, ModelVariant};
use tracing::{debug, info, warn};

mod credentials;
mod errors;
mod gemini;
mod request;
mod session;

pub use credentials::{CredentialStrategy, Credentials};
pub use errors::AnalysisError;
pub use gemini::GeminiTransport;
pub use request::{build_analysis_request, build_chat_request, media_part, ModelRequest, RequestPart};
pub use session::{ErrorBanner, Session, DEFAULT_CONFIDENCE_THRESHOLD};

const DEFAULT_REQUEST_TIMEOUT_S: f64 = 120.0;
const MIN_REQUEST_TIMEOUT_S: f64 = 15.0;
const MAX_REQUEST_TIMEOUT_S: f64 = 600.0;

#[derive(Debug, Clone)]
pub struct TransportReply {
    pub text: Option<String>,
    pub model: String,
    pub usage: Value,
}

/// The external reasoning endpoint. Implementations perform exactly one
/// network exchange per call.
pub trait ModelTransport: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, api_key: &str, request: &ModelRequest) -> anyhow::Result<TransportReply>;
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub model: String,
    pub fallback_reason: Option<String>,
    pub elapsed: Duration,
}

/// Builds requests, calls the transport and turns replies into typed
/// results or [`AnalysisError`]s. Holds no per-session state.
pub struct AnalysisEngine {
    transport: Box<dyn ModelTransport>,
    selector: ModelSelector,
    model_overrides: HashMap<ModelVariant, String>,
    request_timeout: Duration,
}

impl AnalysisEngine {
    pub fn new<T: ModelTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
            selector: ModelSelector::new(None),
            model_overrides: HashMap::new(),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_S),
        }
    }

    /// Gemini transport plus `SIGNLENS_FAST_MODEL` / `SIGNLENS_DEEP_MODEL`
    /// overrides from the environment.
    pub fn gemini() -> Self {
        let mut engine = Self::new(GeminiTransport::new());
        for (variant, key) in [
            (ModelVariant::Fast, "SIGNLENS_FAST_MODEL"),
            (ModelVariant::Deep, "SIGNLENS_DEEP_MODEL"),
        ] {
            if let Some(name) = non_empty_env(key) {
                engine.model_overrides.insert(variant, name);
            }
        }
        engine
    }

    pub fn with_model_override(mut self, variant: ModelVariant, name: impl Into<String>) -> Self {
        self.model_overrides.insert(variant, name.into());
        self
    }

    /// Clamped to 15..=600 seconds; non-finite values keep the default.
    pub fn with_request_timeout(mut self, seconds: f64) -> Self {
        let seconds = if seconds.is_finite() {
            seconds.clamp(MIN_REQUEST_TIMEOUT_S, MAX_REQUEST_TIMEOUT_S)
        } else {
            DEFAULT_REQUEST_TIMEOUT_S
        };
        self.request_timeout = Duration::from_secs_f64(seconds);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn resolve_model(&self, variant: ModelVariant) -> Result<(ModelSpec, Option<String>), AnalysisError> {
        let requested = self.model_overrides.get(&variant).map(String::as_str);
        let selection = self
            .selector
            .select(variant, requested)
            .map_err(AnalysisError::RequestFailed)?;
        if let Some(reason) = selection.fallback_reason.as_deref() {
            warn!(variant = %variant, reason, "model override ignored");
        }
        Ok((selection.model, selection.fallback_reason))
    }

    /// Runs one analysis call. The credential is checked before the media is
    /// encoded or anything is sent.
    pub fn analyze(
        &self,
        credentials: &Credentials,
        variant: ModelVariant,
        media: &MediaAsset,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let api_key = credentials
            .resolve()
            .ok_or(AnalysisError::MissingCredential)?;
        let (model, fallback_reason) = self.resolve_model(variant)?;
        let started = Instant::now();
        info!(
            model = %model.name,
            media = media.name(),
            mime = media.mime_type(),
            bytes = media.len(),
            "analysis request"
        );

        let request = build_analysis_request(media, model, self.request_timeout);
        let text = self.send(api_key, &request)?;
        let result = parse_analysis_text(&text).map_err(|err| {
            warn!(error = %err, "analysis payload did not parse");
            AnalysisError::MalformedResult(err.to_string())
        })?;

        let elapsed = started.elapsed();
        info!(
            signs = result.signs.len(),
            transcript = result.transcript.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "analysis completed"
        );
        Ok(AnalysisOutcome {
            result,
            model: request.model.name,
            fallback_reason,
            elapsed,
        })
    }

    /// Runs one chat turn and returns the model's reply text. `history` holds
    /// the turns before `question`.
    pub fn chat_reply(
        &self,
        credentials: &Credentials,
        variant: ModelVariant,
        media: &MediaAsset,
        result: Option<&AnalysisResult>,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AnalysisError> {
        let api_key = credentials
            .resolve()
            .ok_or(AnalysisError::MissingCredential)?;
        let (model, _) = self.resolve_model(variant)?;
        debug!(model = %model.name, history = history.len(), "chat request");

        let request = build_chat_request(
            media,
            model,
            result,
            history,
            question,
            self.request_timeout,
        );
        let text = self.send(api_key, &request)?;
        Ok(text.trim().to_string())
    }

    fn send(&self, api_key: &str, request: &ModelRequest) -> Result<String, AnalysisError> {
        let reply = self.transport.generate(api_key, request).map_err(|err| {
            let classified = AnalysisError::from_transport(&err, api_key);
            warn!(
                transport = self.transport.name(),
                kind = classified.kind(),
                "model request failed"
            );
            classified
        })?;
        if !reply.usage.is_null() {
            debug!(model = %reply.model, usage = %reply.usage, "model usage");
        }
        reply
            .text
            .filter(|text| !text.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
