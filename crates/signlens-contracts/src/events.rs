use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    MediaSelected,
    AnalysisStarted,
    AnalysisCompleted,
    AnalysisFailed,
    ChatTurnCompleted,
    ChatTurnFailed,
    ThresholdChanged,
    VariantChanged,
}

impl SessionEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MediaSelected => "media_selected",
            Self::AnalysisStarted => "analysis_started",
            Self::AnalysisCompleted => "analysis_completed",
            Self::AnalysisFailed => "analysis_failed",
            Self::ChatTurnCompleted => "chat_turn_completed",
            Self::ChatTurnFailed => "chat_turn_failed",
            Self::ThresholdChanged => "threshold_changed",
            Self::VariantChanged => "variant_changed",
        }
    }
}

const RESERVED_FIELDS: [&str; 3] = ["type", "session_id", "ts"];

#[derive(Serialize)]
struct EventLine<'a> {
    #[serde(rename = "type")]
    event: SessionEvent,
    session_id: &'a str,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    details: Map<String, Value>,
}

/// Session activity log, one JSON object per line.
///
/// Every line starts with `type`, `session_id` and `ts`; detail fields with
/// those names are dropped. The file is opened on the first event and held
/// for the rest of the session.
#[derive(Debug)]
pub struct EventWriter {
    path: PathBuf,
    session_id: String,
    file: Mutex<Option<File>>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
            file: Mutex::new(None),
        }
    }

    /// `details` must be a JSON object or null.
    pub fn emit(&self, event: SessionEvent, details: Value) -> Result<()> {
        let details = match details {
            Value::Object(map) => map
                .into_iter()
                .filter(|(key, _)| !RESERVED_FIELDS.contains(&key.as_str()))
                .collect(),
            Value::Null => Map::new(),
            other => bail!("{} details must be an object, got {other}", event.as_str()),
        };
        let line = serde_json::to_string(&EventLine {
            event,
            session_id: &self.session_id,
            ts: Utc::now(),
            details,
        })?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?;
        if file.is_none() {
            *file = Some(self.open()?);
        }
        if let Some(file) = file.as_mut() {
            writeln!(file, "{line}")
                .with_context(|| format!("failed writing {}", self.path.display()))?;
        }
        Ok(())
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("cannot open event log {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn read_lines(path: &Path) -> Result<Vec<Value>> {
        fs::read_to_string(path)?
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).map_err(Into::into))
            .collect()
    }

    #[test]
    fn first_event_creates_the_log_with_header_fields() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        writer.emit(SessionEvent::MediaSelected, json!({ "media": "clip.mp4" }))?;

        let lines = read_lines(&path)?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], json!("media_selected"));
        assert_eq!(lines[0]["session_id"], json!("session-123"));
        assert_eq!(lines[0]["media"], json!("clip.mp4"));
        DateTime::parse_from_rfc3339(lines[0]["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn details_cannot_replace_header_fields() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        writer.emit(
            SessionEvent::AnalysisStarted,
            json!({ "type": "forged", "session_id": "other", "variant": "fast" }),
        )?;

        let lines = read_lines(&path)?;
        assert_eq!(lines[0]["type"], json!("analysis_started"));
        assert_eq!(lines[0]["session_id"], json!("session-123"));
        assert_eq!(lines[0]["variant"], json!("fast"));
        Ok(())
    }

    #[test]
    fn events_append_in_call_order() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        writer.emit(SessionEvent::ChatTurnCompleted, Value::Null)?;
        writer.emit(SessionEvent::ChatTurnFailed, json!({ "turn": 2 }))?;

        let types: Vec<Value> = read_lines(&path)?
            .into_iter()
            .map(|line| line["type"].clone())
            .collect();
        assert_eq!(types, vec![json!("chat_turn_completed"), json!("chat_turn_failed")]);
        Ok(())
    }

    #[test]
    fn non_object_details_are_rejected_without_writing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-123");

        assert!(writer.emit(SessionEvent::ThresholdChanged, json!(0.5)).is_err());
        assert!(!path.exists());
        Ok(())
    }
}
