#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Gateway;
use crate::domain::models::InstagramResult;
use crate::domain::models::SentimentLabel;
use crate::domain::models::SentimentScores;
use crate::domain::models::Session;
use crate::domain::models::TextResult;

/// Audience categories the analysis server may name in an interpretation.
pub const AUDIENCE_CATEGORIES: [&str; 9] = [
    "Curious",
    "Understanding",
    "Accepting",
    "Excited",
    "Neutral",
    "Confused",
    "Frustrated",
    "Frightened",
    "Sad",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum ScoreValue {
    Number(f64),
    Text(String),
}

impl ScoreValue {
    /// Ratios come back either as `"12.50%"` or as plain numbers, where
    /// anything above 1 is taken to be a percentage.
    fn to_ratio(&self) -> Result<f64> {
        let value = match self {
            ScoreValue::Number(num) => *num,
            ScoreValue::Text(text) => text.trim().trim_end_matches('%').trim().parse::<f64>()?,
        };

        let is_percent = matches!(self, ScoreValue::Text(text) if text.contains('%')) || value > 1.0;
        if is_percent {
            return Ok(value / 100.0);
        }

        return Ok(value);
    }

    fn to_compound(&self) -> Result<f64> {
        match self {
            ScoreValue::Number(num) => return Ok(*num),
            ScoreValue::Text(text) => return Ok(text.trim().parse::<f64>()?),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScoresPayload {
    positive: ScoreValue,
    neutral: ScoreValue,
    negative: ScoreValue,
    compound: ScoreValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TextAnalysisRequest {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TextAnalysisResponse {
    scores: ScoresPayload,
    explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstagramAnalysisRequest {
    session_id: String,
    username: String,
    post_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NativeInstagramResponse {
    caption: Option<String>,
    avg_compound_score: f64,
    interpretation: String,
}

impl From<NativeInstagramResponse> for InstagramResult {
    fn from(res: NativeInstagramResponse) -> InstagramResult {
        let mut emotional_category = AUDIENCE_CATEGORIES
            .iter()
            .filter(|e| return res.interpretation.contains(*e))
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();

        if emotional_category.is_empty() {
            emotional_category =
                vec![SentimentLabel::from_compound(res.avg_compound_score).to_string()];
        }

        return InstagramResult {
            emotional_category,
            explanation: res.interpretation,
            average_sentiment_score: res.avg_compound_score,
            caption: res.caption,
            ..InstagramResult::default()
        };
    }
}

fn default_explanation(label: SentimentLabel) -> String {
    match label {
        SentimentLabel::Positive => {
            return "The text expresses an overall positive sentiment.".to_string();
        }
        SentimentLabel::Neutral => {
            return "The text is largely neutral in tone.".to_string();
        }
        SentimentLabel::Negative => {
            return "The text expresses an overall negative sentiment.".to_string();
        }
    }
}

pub struct HttpGateway {
    url: String,
    timeout: String,
}

impl Default for HttpGateway {
    fn default() -> HttpGateway {
        return HttpGateway {
            url: Config::get(ConfigKey::GatewayURL),
            timeout: Config::get(ConfigKey::GatewayTimeout),
        };
    }
}

impl HttpGateway {
    async fn post_json<T: Serialize>(&self, route: &str, body: &T) -> Result<serde_json::Value> {
        let res = reqwest::Client::new()
            .post(format!("{url}{route}", url = self.url))
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), route = route, "Analysis request failed");
            bail!("Analysis server responded with status {}", status.as_u16());
        }

        let payload = res.json::<serde_json::Value>().await?;
        if let Some(err) = payload.get("error") {
            tracing::error!(route = route, error = %err, "Analysis server reported an error");
            bail!("Analysis server reported an error: {err}");
        }

        return Ok(payload);
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Analysis server is not running");
                bail!("Analysis server is not running at {}", self.url);
            }
        };

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Analysis server health check failed");
            bail!("Analysis server health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn analyze_text(&self, text: &str) -> Result<TextResult> {
        let req = TextAnalysisRequest {
            text: text.to_string(),
        };
        let payload = self.post_json("/api/text-analysis", &req).await?;
        let res = serde_json::from_value::<TextAnalysisResponse>(payload)?;
        tracing::debug!(body = ?res, "Text analysis response");

        let scores = SentimentScores {
            positive: res.scores.positive.to_ratio()?,
            neutral: res.scores.neutral.to_ratio()?,
            negative: res.scores.negative.to_ratio()?,
            compound: res.scores.compound.to_compound()?,
        };

        let explanation = match res.explanation {
            Some(explanation) if !explanation.trim().is_empty() => explanation,
            _ => default_explanation(SentimentLabel::from_compound(scores.compound)),
        };

        return Ok(TextResult {
            scores,
            explanation,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn analyze_instagram_post(
        &self,
        reference: &str,
        session: &Session,
    ) -> Result<InstagramResult> {
        let req = InstagramAnalysisRequest {
            session_id: session.session_token.to_string(),
            username: session.username.to_string(),
            post_url: reference.to_string(),
        };
        let payload = self.post_json("/api/insta-analysis", &req).await?;

        if payload.get("emotionalCategory").is_some() {
            return Ok(serde_json::from_value::<InstagramResult>(payload)?);
        }

        let res = serde_json::from_value::<NativeInstagramResponse>(payload)?;
        tracing::debug!(score = res.avg_compound_score, "Instagram analysis response");
        return Ok(InstagramResult::from(res));
    }
}
