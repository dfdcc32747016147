use thiserror::Error;

/// Failures surfaced to the caller of an analysis or chat turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No media has been selected
    #[error("no media selected")]
    NoMedia,

    /// Neither a user override nor an environment default is available
    #[error("no API key available; set GEMINI_API_KEY or supply a key")]
    MissingCredential,

    /// Rate limit or quota exhaustion reported by the endpoint
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The endpoint answered without any text
    #[error("the model returned an empty response")]
    EmptyResponse,

    /// The endpoint answered, but the answer is not a usable result
    #[error("the model returned an unusable result: {0}")]
    MalformedResult(String),

    /// Any other transport or endpoint failure
    #[error("request failed: {0}")]
    RequestFailed(String),
}

impl AnalysisError {
    /// Whether switching the model variant or supplying a private key is
    /// worth suggesting.
    pub fn suggests_alternatives(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoMedia => "no_media",
            Self::MissingCredential => "missing_credential",
            Self::QuotaExceeded(_) => "quota_exceeded",
            Self::EmptyResponse => "empty_response",
            Self::MalformedResult(_) => "malformed_result",
            Self::RequestFailed(_) => "request_failed",
        }
    }

    /// Maps a transport failure into the taxonomy. `api_key` is masked out of
    /// the rendered chain before anything else reads it. Quota detection
    /// matches rate-limit markers in that text; it is best effort.
    pub fn from_transport(err: &anyhow::Error, api_key: &str) -> Self {
        let full = redact(&error_chain_text(err, usize::MAX), api_key);
        let text = truncate_text(&full, 600);
        if looks_like_rate_limit(&full) {
            Self::QuotaExceeded(text)
        } else {
            Self::RequestFailed(text)
        }
    }
}

const RATE_LIMIT_MARKERS: &[&str] = &[
    "429",
    "quota",
    "resource_exhausted",
    "rate limit",
    "rate-limit",
    "too many requests",
];

pub(crate) fn looks_like_rate_limit(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn redact(text: &str, secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "[redacted]")
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing: &String| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
