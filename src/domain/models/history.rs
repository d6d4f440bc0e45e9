#[cfg(test)]
#[path = "history_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;
use chrono::TimeZone;
use serde::Deserialize;
use serde::Serialize;

use super::InstagramResult;
use super::TextResult;
use super::ViewMode;

pub const PREVIEW_MAX_CHARS: usize = 60;
pub const PREVIEW_ELLIPSIS: &str = "...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HistoryKind {
    Text,
    Instagram,
}

/// Untagged so camelCase records without a tag load as-is. The owning item's
/// `kind` is checked against the variant on restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Text(TextResult),
    Instagram(InstagramResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> HistoryKind {
        match self {
            AnalysisResult::Text(_) => return HistoryKind::Text,
            AnalysisResult::Instagram(_) => return HistoryKind::Instagram,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    #[serde(rename = "date")]
    pub created_at: i64,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub preview: String,
    pub result: AnalysisResult,
}

impl HistoryItem {
    pub fn new(id: String, created_at: i64, source: &str, result: AnalysisResult) -> HistoryItem {
        return HistoryItem {
            id,
            created_at,
            kind: result.kind(),
            preview: HistoryItem::preview_of(source),
            result,
        };
    }

    pub fn preview_of(source: &str) -> String {
        if source.chars().count() <= PREVIEW_MAX_CHARS {
            return source.to_string();
        }

        let truncated = source.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
        return format!("{truncated}{PREVIEW_ELLIPSIS}");
    }

    pub fn is_consistent(&self) -> bool {
        return self.kind == self.result.kind() && !self.id.is_empty();
    }

    pub fn created_at_local(&self) -> Option<DateTime<Local>> {
        return Local.timestamp_millis_opt(self.created_at).single();
    }

    /// One line for list views: kind, local time and preview.
    pub fn summary(&self) -> String {
        let when = self
            .created_at_local()
            .map(|e| return e.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| return "unknown date".to_string());

        return format!("[{}] {when} {}", self.kind, self.preview);
    }
}

/// Everything needed to re-render a stored analysis without calling the
/// gateway again.
#[derive(Clone, Debug, PartialEq)]
pub struct Replay {
    pub view_mode: ViewMode,
    pub input: String,
    pub result: AnalysisResult,
}

impl From<&HistoryItem> for Replay {
    fn from(item: &HistoryItem) -> Replay {
        let view_mode = match item.kind {
            HistoryKind::Text => ViewMode::Text,
            HistoryKind::Instagram => ViewMode::Instagram,
        };

        return Replay {
            view_mode,
            input: item.preview.to_string(),
            result: item.result.clone(),
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub text_count: usize,
    pub instagram_count: usize,
    pub mean_text_compound: Option<f64>,
    pub mean_instagram_score: Option<f64>,
}

impl HistoryStats {
    pub fn from_items(items: &[HistoryItem]) -> HistoryStats {
        let mut text_scores: Vec<f64> = vec![];
        let mut instagram_scores: Vec<f64> = vec![];

        for item in items {
            match &item.result {
                AnalysisResult::Text(res) => text_scores.push(res.scores.compound),
                AnalysisResult::Instagram(res) => instagram_scores.push(res.average_sentiment_score),
            }
        }

        return HistoryStats {
            total: items.len(),
            text_count: text_scores.len(),
            instagram_count: instagram_scores.len(),
            mean_text_compound: mean(&text_scores),
            mean_instagram_score: mean(&instagram_scores),
        };
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    return Some(values.iter().sum::<f64>() / values.len() as f64);
}
