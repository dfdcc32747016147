use serde_json::{json, Value};
use signlens_contracts::analysis::AnalysisResult;
use signlens_contracts::chat::{ChatLog, ChatMessage};
use signlens_contracts::events::{EventWriter, SessionEvent};
use signlens_contracts::media::MediaAsset;
use signlens_contracts::models::ModelVariant;
use signlens_contracts::timeline::{build_timeline, TimelineItem, TimelineOrder};
use tracing::warn;

use crate::{AnalysisEngine, AnalysisError, Credentials};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// The single visible analysis error. A new failure replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub error: AnalysisError,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorBanner {
    fn new(error: AnalysisError, variant: ModelVariant) -> Self {
        let hint = error.suggests_alternatives().then(|| {
            format!(
                "Try the {} model variant or supply your own API key.",
                variant.other()
            )
        });
        Self {
            message: error.to_string(),
            error,
            hint,
        }
    }
}

/// Everything one user works with: the selected media, its latest analysis,
/// the chat about it, and the display settings.
///
/// Operations take `&mut self`, so at most one request is in flight per
/// session.
pub struct Session {
    engine: AnalysisEngine,
    credentials: Credentials,
    variant: ModelVariant,
    media: Option<MediaAsset>,
    result: Option<AnalysisResult>,
    last_model: Option<String>,
    banner: Option<ErrorBanner>,
    chat: ChatLog,
    threshold: f64,
    order: TimelineOrder,
    events: Option<EventWriter>,
}

impl Session {
    pub fn new(engine: AnalysisEngine, credentials: Credentials) -> Self {
        Self {
            engine,
            credentials,
            variant: ModelVariant::default(),
            media: None,
            result: None,
            last_model: None,
            banner: None,
            chat: ChatLog::new(),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            order: TimelineOrder::default(),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_order(mut self, order: TimelineOrder) -> Self {
        self.order = order;
        self
    }

    pub fn media(&self) -> Option<&MediaAsset> {
        self.media.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn last_model(&self) -> Option<&str> {
        self.last_model.as_deref()
    }

    pub fn banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Replaces the media. The previous result, error and chat log belong to
    /// the old media and are dropped.
    pub fn select_media(&mut self, media: MediaAsset) -> anyhow::Result<()> {
        if !media.is_supported() {
            anyhow::bail!(
                "{} has type {}; only video/* and audio/* files are accepted",
                media.name(),
                media.mime_type()
            );
        }
        self.emit(
            SessionEvent::MediaSelected,
            json!({
                "media": media.name(),
                "mime_type": media.mime_type(),
                "bytes": media.len(),
            }),
        );
        self.media = Some(media);
        self.result = None;
        self.last_model = None;
        self.banner = None;
        self.chat.reset();
        Ok(())
    }

    /// Clamps into `[0, 1]`. NaN is rejected and leaves the threshold as is.
    pub fn set_threshold(&mut self, threshold: f64) -> anyhow::Result<f64> {
        if threshold.is_nan() {
            anyhow::bail!("confidence threshold must be a number between 0 and 1");
        }
        self.threshold = threshold.clamp(0.0, 1.0);
        self.emit(
            SessionEvent::ThresholdChanged,
            json!({ "threshold": self.threshold }),
        );
        Ok(self.threshold)
    }

    pub fn set_variant(&mut self, variant: ModelVariant) {
        self.variant = variant;
        self.emit(
            SessionEvent::VariantChanged,
            json!({ "variant": variant.as_str() }),
        );
    }

    pub fn set_credential_override(&mut self, credential: Option<String>) {
        self.credentials.set_override(credential);
    }

    /// Drops every user-supplied key for the rest of the session; only the
    /// environment default can resolve afterwards.
    pub fn forget_credential(&mut self) {
        self.credentials.forget_user_keys();
    }

    pub fn set_order(&mut self, order: TimelineOrder) {
        self.order = order;
    }

    pub fn timeline(&self) -> Vec<TimelineItem> {
        build_timeline(self.result.as_ref(), self.threshold, self.order)
    }

    /// Analyzes the current media. On success the result replaces any
    /// previous one and the banner clears; on failure the banner is set and
    /// the previous result is kept.
    pub fn analyze(&mut self) -> Result<&AnalysisResult, AnalysisError> {
        let outcome = match self.media.as_ref() {
            None => Err(AnalysisError::NoMedia),
            Some(media) => {
                self.emit_started(media.name());
                self.engine.analyze(&self.credentials, self.variant, media)
            }
        };

        match outcome {
            Ok(outcome) => {
                self.emit(
                    SessionEvent::AnalysisCompleted,
                    json!({
                        "model": outcome.model,
                        "signs": outcome.result.signs.len(),
                        "transcript": outcome.result.transcript.len(),
                        "elapsed_ms": outcome.elapsed.as_millis() as u64,
                        "fallback_reason": outcome.fallback_reason,
                    }),
                );
                self.banner = None;
                self.last_model = Some(outcome.model);
                Ok(self.result.insert(outcome.result))
            }
            Err(err) => {
                self.emit(
                    SessionEvent::AnalysisFailed,
                    json!({ "kind": err.kind(), "error": err.to_string() }),
                );
                self.banner = Some(ErrorBanner::new(err.clone(), self.variant));
                Err(err)
            }
        }
    }

    /// Asks a follow-up question. The user turn is always logged, followed
    /// by either the reply or an in-band `Error:` message. Blank questions
    /// are ignored and return `None`.
    pub fn ask(&mut self, question: &str) -> Option<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }
        self.chat.push_user(question);
        let history_len = self.chat.len() - 1;

        let reply = match self.media.as_ref() {
            None => Err(AnalysisError::NoMedia),
            Some(media) => self.engine.chat_reply(
                &self.credentials,
                self.variant,
                media,
                self.result.as_ref(),
                &self.chat.messages()[..history_len],
                question,
            ),
        };

        let text = match reply {
            Ok(text) => {
                self.emit(
                    SessionEvent::ChatTurnCompleted,
                    json!({ "turn": history_len / 2 + 1, "chars": text.chars().count() }),
                );
                text
            }
            Err(err) => {
                self.emit(
                    SessionEvent::ChatTurnFailed,
                    json!({ "turn": history_len / 2 + 1, "kind": err.kind(), "error": err.to_string() }),
                );
                format!("Error: {err}")
            }
        };
        Some(self.chat.push_model(text))
    }

    fn emit_started(&self, media: &str) {
        self.emit(
            SessionEvent::AnalysisStarted,
            json!({ "media": media, "variant": self.variant.as_str() }),
        );
    }

    /// Event log failures are logged and otherwise ignored; they never
    /// change session state.
    fn emit(&self, event: SessionEvent, payload: Value) {
        let Some(writer) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = writer.emit(event, payload) {
            warn!(event = event.as_str(), error = %err, "event log write failed");
        }
    }
}
