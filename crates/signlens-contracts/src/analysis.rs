use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignDetection {
    pub timestamp: String,
    pub gesture: String,
    pub meaning: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub timestamp: String,
    pub speaker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAnalysis {
    pub environment: String,
    pub tone: String,
    pub nuances: Vec<String>,
    pub cultural_notes: String,
    pub reasoning: String,
}

/// One complete model answer. Either fully present or absent; never merged
/// with a previous result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub signs: Vec<SignDetection>,
    pub transcript: Vec<TranscriptSegment>,
    pub context: ContextAnalysis,
}

/// Strips a surrounding markdown code fence (optionally tagged `json`).
///
/// Text without a leading fence is returned trimmed and otherwise untouched.
pub fn unwrap_fenced_json(text: &str) -> &str {
    let raw = text.trim();
    let Some(body) = raw.strip_prefix("```") else {
        return raw;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    };
    body.trim()
}

/// Parses raw model text into an [`AnalysisResult`].
///
/// Any missing field or syntax error is an error; nothing is defaulted.
pub fn parse_analysis_text(text: &str) -> Result<AnalysisResult, serde_json::Error> {
    serde_json::from_str(unwrap_fenced_json(text))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_json() -> String {
        json!({
            "signs": [
                {"timestamp": "00:10", "gesture": "Wave", "meaning": "Hello", "confidence": 0.9}
            ],
            "transcript": [
                {"timestamp": "00:05", "speaker": "A", "text": "Hi"}
            ],
            "context": {
                "environment": "Kitchen",
                "tone": "Friendly",
                "nuances": ["smiling"],
                "culturalNotes": "Casual greeting",
                "reasoning": "Open palm wave"
            }
        })
        .to_string()
    }

    #[test]
    fn unwrap_strips_json_tagged_fence() {
        let fenced = "```json\n{\"a\":1}\n```";
        assert_eq!(unwrap_fenced_json(fenced), "{\"a\":1}");
    }

    #[test]
    fn unwrap_strips_bare_and_uppercase_fences() {
        assert_eq!(unwrap_fenced_json("```\n{}\n```"), "{}");
        assert_eq!(unwrap_fenced_json("  ```JSON {} ```  "), "{}");
    }

    #[test]
    fn unwrap_leaves_plain_text_alone() {
        assert_eq!(unwrap_fenced_json("  {\"a\": 1}\n"), "{\"a\": 1}");
        assert_eq!(unwrap_fenced_json("not json"), "not json");
    }

    #[test]
    fn unwrap_tolerates_missing_closing_fence() {
        assert_eq!(unwrap_fenced_json("```json\n{}"), "{}");
    }

    #[test]
    fn fenced_and_plain_payloads_parse_identically() -> anyhow::Result<()> {
        let plain = sample_json();
        let fenced = format!("```json\n{plain}\n```");
        let a = parse_analysis_text(&plain)?;
        let b = parse_analysis_text(&fenced)?;
        assert_eq!(a, b);
        assert_eq!(a.signs[0].gesture, "Wave");
        assert_eq!(a.context.cultural_notes, "Casual greeting");
        Ok(())
    }

    #[test]
    fn malformed_payloads_are_errors_not_defaults() {
        assert!(parse_analysis_text("{\"signs\": [").is_err());
        assert!(parse_analysis_text("").is_err());
        assert!(parse_analysis_text("```json\n```").is_err());
        assert!(parse_analysis_text("{\"signs\": [], \"transcript\": []}").is_err());
    }

    #[test]
    fn context_serializes_with_camel_case_notes() -> anyhow::Result<()> {
        let parsed = parse_analysis_text(&sample_json())?;
        let value = serde_json::to_value(&parsed.context)?;
        assert_eq!(value["culturalNotes"], json!("Casual greeting"));
        assert!(value.get("cultural_notes").is_none());
        Ok(())
    }
}
