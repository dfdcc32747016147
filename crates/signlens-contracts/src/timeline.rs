//! Threshold filtering and chronological merge of signs and transcript.
//!
//! The default ordering compares the raw `MM:SS` strings. That is correct for
//! zero-padded stamps below 100 minutes; beyond that `"100:00"` sorts before
//! `"20:00"`. [`TimelineOrder::Numeric`] is available as an opt-in.

use std::cmp::Ordering;

use serde::Serialize;

use crate::analysis::{AnalysisResult, SignDetection, TranscriptSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Sign,
    Transcript,
}

impl TimelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Transcript => "transcript",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineItem {
    Sign(SignDetection),
    Transcript(TranscriptSegment),
}

impl TimelineItem {
    pub fn kind(&self) -> TimelineKind {
        match self {
            Self::Sign(_) => TimelineKind::Sign,
            Self::Transcript(_) => TimelineKind::Transcript,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            Self::Sign(sign) => &sign.timestamp,
            Self::Transcript(segment) => &segment.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineOrder {
    #[default]
    Lexicographic,
    Numeric,
}

/// Signs whose confidence is at or above `threshold`. The boundary is inclusive.
pub fn filter_signs(signs: &[SignDetection], threshold: f64) -> Vec<&SignDetection> {
    signs
        .iter()
        .filter(|sign| sign.confidence >= threshold)
        .collect()
}

pub fn build_timeline(
    result: Option<&AnalysisResult>,
    threshold: f64,
    order: TimelineOrder,
) -> Vec<TimelineItem> {
    let Some(result) = result else {
        return Vec::new();
    };

    let mut items: Vec<TimelineItem> = filter_signs(&result.signs, threshold)
        .into_iter()
        .cloned()
        .map(TimelineItem::Sign)
        .chain(
            result
                .transcript
                .iter()
                .cloned()
                .map(TimelineItem::Transcript),
        )
        .collect();

    match order {
        TimelineOrder::Lexicographic => {
            items.sort_by(|left, right| left.timestamp().cmp(right.timestamp()))
        }
        TimelineOrder::Numeric => items.sort_by(|left, right| {
            compare_numeric(left.timestamp(), right.timestamp())
        }),
    }
    items
}

/// Parses `MM:SS` or `H:MM:SS` into whole seconds.
pub fn timestamp_seconds(raw: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut fields = 0;
    for part in raw.trim().split(':') {
        let part = part.trim();
        if part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        let value: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
        fields += 1;
    }
    if !(2..=3).contains(&fields) {
        return None;
    }
    Some(total)
}

fn compare_numeric(left: &str, right: &str) -> Ordering {
    match (timestamp_seconds(left), timestamp_seconds(right)) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| left.cmp(right)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => left.cmp(right),
    }
}
