use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::InstagramResult;
use super::Session;
use super::TextResult;

#[async_trait]
pub trait Gateway {
    /// Used at startup to warn early when the analysis server can't be
    /// reached. Failing this never blocks the dashboard from opening.
    async fn health_check(&self) -> Result<()>;

    /// Scores a free text blob.
    async fn analyze_text(&self, text: &str) -> Result<TextResult>;

    /// Scrapes and scores a post's caption and comments. The session is
    /// forwarded so the server can authenticate as the user.
    async fn analyze_instagram_post(
        &self,
        reference: &str,
        session: &Session,
    ) -> Result<InstagramResult>;
}

pub type GatewayBox = Arc<dyn Gateway + Send + Sync>;
