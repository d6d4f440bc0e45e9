#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

/// Scores use the VADER split: positive, neutral and negative are ratios in
/// `[0, 1]`, compound is in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub compound: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    pub scores: SentimentScores,
    pub explanation: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramResult {
    pub emotional_category: Vec<String>,
    pub explanation: String,
    pub average_sentiment_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_content_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_comments: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_compound(compound: f64) -> SentimentLabel {
        if compound >= 0.05 {
            return SentimentLabel::Positive;
        }
        if compound <= -0.05 {
            return SentimentLabel::Negative;
        }

        return SentimentLabel::Neutral;
    }
}

impl TextResult {
    pub fn label(&self) -> SentimentLabel {
        return SentimentLabel::from_compound(self.scores.compound);
    }
}

impl InstagramResult {
    pub fn label(&self) -> SentimentLabel {
        return SentimentLabel::from_compound(self.average_sentiment_score);
    }
}
