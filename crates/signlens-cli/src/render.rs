use chrono::Local;
use signlens_contracts::analysis::ContextAnalysis;
use signlens_contracts::chat::{ChatMessage, ChatRole};
use signlens_contracts::timeline::TimelineItem;
use signlens_engine::ErrorBanner;

pub(crate) fn timeline_row(item: &TimelineItem) -> String {
    match item {
        TimelineItem::Sign(sign) => format!(
            "[{}] SIGN   {} - {} ({}%)",
            sign.timestamp,
            sign.gesture,
            sign.meaning,
            (sign.confidence * 100.0).round() as i64
        ),
        TimelineItem::Transcript(segment) => format!(
            "[{}] SPEECH {}: {}",
            segment.timestamp, segment.speaker, segment.text
        ),
    }
}

pub(crate) fn timeline(items: &[TimelineItem], threshold: f64) -> String {
    if items.is_empty() {
        return format!(
            "No timeline entries at confidence >= {:.2}.",
            threshold
        );
    }
    items
        .iter()
        .map(timeline_row)
        .collect::<Vec<String>>()
        .join("\n")
}

pub(crate) fn context(context: &ContextAnalysis) -> String {
    let mut lines = vec![
        format!("Environment: {}", context.environment),
        format!("Tone: {}", context.tone),
    ];
    if !context.nuances.is_empty() {
        lines.push("Nuances:".to_string());
        lines.extend(context.nuances.iter().map(|nuance| format!("  - {nuance}")));
    }
    lines.push(format!("Cultural notes: {}", context.cultural_notes));
    lines.push(format!("Reasoning: {}", context.reasoning));
    lines.join("\n")
}

pub(crate) fn banner(banner: &ErrorBanner) -> String {
    match banner.hint.as_deref() {
        Some(hint) => format!("Analysis failed: {}\n{hint}", banner.message),
        None => format!("Analysis failed: {}", banner.message),
    }
}

pub(crate) fn chat_message(message: &ChatMessage) -> String {
    let who = match message.role {
        ChatRole::User => "you",
        ChatRole::Model => "model",
    };
    format!(
        "{} {who}> {}",
        message.timestamp.with_timezone(&Local).format("%H:%M"),
        message.text
    )
}
