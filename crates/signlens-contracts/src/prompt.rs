//! Fixed instructions and the structured-output schema sent with every
//! analysis request, plus the text framing used for follow-up chat turns.

use serde_json::{json, Value};

use crate::analysis::AnalysisResult;
use crate::chat::{format_transcript, ChatMessage};

pub const ANALYSIS_INSTRUCTIONS: &str = "\
You are an expert sign language interpreter and multimodal communication analyst.
Analyze the attached media and return JSON only.

1. Sign detection: identify every sign language gesture. For each, give the \
timestamp (MM:SS), a short description of the gesture, its meaning in English, \
and your confidence between 0 and 1.
2. Speech transcription: transcribe all spoken audio. For each segment, give the \
timestamp (MM:SS), the speaker label, and the text.
3. Context analysis: describe the environment, the overall tone, notable \
nuances (facial expressions, body language, emphasis), relevant cultural notes \
about the signing community or dialect, and your reasoning for the \
interpretation.

Use zero-padded MM:SS timestamps. If there is no signing or no speech, return \
an empty list for that section.";

/// Response schema mirroring [`AnalysisResult`] field for field, in the
/// OpenAPI subset the generateContent endpoint accepts.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "signs": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "timestamp": {"type": "STRING", "description": "MM:SS"},
                        "gesture": {"type": "STRING"},
                        "meaning": {"type": "STRING"},
                        "confidence": {"type": "NUMBER"}
                    },
                    "required": ["timestamp", "gesture", "meaning", "confidence"]
                }
            },
            "transcript": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "timestamp": {"type": "STRING", "description": "MM:SS"},
                        "speaker": {"type": "STRING"},
                        "text": {"type": "STRING"}
                    },
                    "required": ["timestamp", "speaker", "text"]
                }
            },
            "context": {
                "type": "OBJECT",
                "properties": {
                    "environment": {"type": "STRING"},
                    "tone": {"type": "STRING"},
                    "nuances": {"type": "ARRAY", "items": {"type": "STRING"}},
                    "culturalNotes": {"type": "STRING"},
                    "reasoning": {"type": "STRING"}
                },
                "required": ["environment", "tone", "nuances", "culturalNotes", "reasoning"]
            }
        },
        "required": ["signs", "transcript", "context"]
    })
}

/// Text block placed after the media for a chat turn: prior analysis, prior
/// turns, then the new question.
pub fn chat_prompt(
    result: Option<&AnalysisResult>,
    history: &[ChatMessage],
    question: &str,
) -> String {
    let analysis = result
        .and_then(|value| serde_json::to_string(value).ok())
        .unwrap_or_else(|| "none yet".to_string());
    let transcript = if history.is_empty() {
        "(no previous messages)".to_string()
    } else {
        format_transcript(history)
    };
    format!(
        "You are an expert sign language interpreter answering questions about the attached media.\n\
Previous analysis (JSON): {analysis}\n\n\
Conversation so far:\n{transcript}\n\n\
User: {question}\n\
Answer concisely, citing MM:SS timestamps where relevant."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .map(|rows| rows.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn schema_requires_every_result_field() {
        let schema = analysis_response_schema();
        assert_eq!(required(&schema), vec!["signs", "transcript", "context"]);
        assert_eq!(
            required(&schema["properties"]["signs"]["items"]),
            vec!["timestamp", "gesture", "meaning", "confidence"]
        );
        assert_eq!(
            required(&schema["properties"]["transcript"]["items"]),
            vec!["timestamp", "speaker", "text"]
        );
        assert_eq!(
            required(&schema["properties"]["context"]),
            vec!["environment", "tone", "nuances", "culturalNotes", "reasoning"]
        );
    }

    #[test]
    fn instructions_cover_all_three_tasks() {
        for needle in ["Sign detection", "Speech transcription", "Context analysis"] {
            assert!(ANALYSIS_INSTRUCTIONS.contains(needle), "{needle}");
        }
    }

    #[test]
    fn chat_prompt_orders_history_before_question() {
        let history = vec![
            ChatMessage::new(ChatRole::User, "who is speaking?"),
            ChatMessage::new(ChatRole::Model, "Speaker A."),
        ];
        let prompt = chat_prompt(None, &history, "and at 00:10?");
        let history_at = prompt.find("User: who is speaking?").unwrap_or(usize::MAX);
        let answer_at = prompt.find("Model: Speaker A.").unwrap_or(usize::MAX);
        let question_at = prompt.find("User: and at 00:10?").unwrap_or(usize::MAX);
        assert!(history_at < answer_at);
        assert!(answer_at < question_at);
        assert!(prompt.contains("Previous analysis (JSON): none yet"));
    }

    #[test]
    fn chat_prompt_without_history_says_so() {
        let prompt = chat_prompt(None, &[], "hello");
        assert!(prompt.contains("(no previous messages)"));
    }
}
