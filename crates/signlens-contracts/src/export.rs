use std::path::Path;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{parse_analysis_text, AnalysisResult};
use crate::timeline::TimelineItem;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisExport<'a> {
    pub media: Option<&'a str>,
    pub model: Option<&'a str>,
    pub threshold: f64,
    pub result: &'a AnalysisResult,
    pub timeline: &'a [TimelineItem],
}

pub fn write_export(path: &Path, export: &AnalysisExport<'_>) -> Result<()> {
    let mut payload = serde_json::to_value(export)?;
    if let Some(object) = payload.as_object_mut() {
        object.insert("exported_at".to_string(), Value::String(now_utc_iso()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&payload)?)
        .with_context(|| format!("failed writing {}", path.display()))?;
    Ok(())
}

#[derive(Deserialize)]
struct ExportEnvelope {
    result: AnalysisResult,
}

/// Loads a result from either an export file or a raw (possibly fenced)
/// model answer saved to disk.
pub fn read_result_file(path: &Path) -> Result<AnalysisResult> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    if let Ok(envelope) = serde_json::from_str::<ExportEnvelope>(&raw) {
        return Ok(envelope.result);
    }
    parse_analysis_text(&raw)
        .with_context(|| format!("{} does not contain an analysis result", path.display()))
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::analysis::{ContextAnalysis, SignDetection};
    use crate::timeline::{build_timeline, TimelineOrder};

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            signs: vec![SignDetection {
                timestamp: "00:10".to_string(),
                gesture: "Wave".to_string(),
                meaning: "Hello".to_string(),
                confidence: 0.9,
            }],
            transcript: Vec::new(),
            context: ContextAnalysis {
                environment: "Park".to_string(),
                tone: "Warm".to_string(),
                nuances: vec!["smile".to_string()],
                cultural_notes: "ASL".to_string(),
                reasoning: "Clear handshape".to_string(),
            },
        }
    }

    #[test]
    fn export_round_trips_through_reader() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("out").join("analysis.json");
        let result = sample_result();
        let timeline = build_timeline(Some(&result), 0.5, TimelineOrder::Lexicographic);
        write_export(
            &path,
            &AnalysisExport {
                media: Some("clip.mp4"),
                model: Some("gemini-2.5-flash"),
                threshold: 0.5,
                result: &result,
                timeline: &timeline,
            },
        )?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(parsed["media"], json!("clip.mp4"));
        assert_eq!(parsed["timeline"][0]["kind"], json!("sign"));
        assert!(parsed.get("exported_at").and_then(Value::as_str).is_some());

        assert_eq!(read_result_file(&path)?, result);
        Ok(())
    }

    #[test]
    fn reader_accepts_fenced_raw_answers() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("raw.txt");
        let body = serde_json::to_string(&sample_result())?;
        std::fs::write(&path, format!("```json\n{body}\n```"))?;
        assert_eq!(read_result_file(&path)?, sample_result());
        Ok(())
    }

    #[test]
    fn reader_rejects_unrelated_json() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("other.json");
        std::fs::write(&path, "{\"hello\": 1}")?;
        assert!(read_result_file(&path).is_err());
        Ok(())
    }
}
