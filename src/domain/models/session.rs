#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::NaveenaError;

pub const LOGIN_VALIDATION_MESSAGE: &str = "Please provide both Username and Session ID.";

/// Credentials handed to the analysis server when scraping a post. The token
/// is an opaque secret and never leaves through `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    #[serde(alias = "sessionId")]
    pub session_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Session {
    pub fn new(username: &str, session_token: &str) -> Result<Session, NaveenaError> {
        if username.trim().is_empty() || session_token.trim().is_empty() {
            return Err(NaveenaError::Validation(
                LOGIN_VALIDATION_MESSAGE.to_string(),
            ));
        }

        return Ok(Session {
            username: username.to_string(),
            session_token: session_token.to_string(),
            avatar_url: Some(Session::avatar_url_for(username)),
        });
    }

    pub fn avatar_url_for(username: &str) -> String {
        return format!(
            "https://ui-avatars.com/api/?name={}&background=E1306C&color=fff",
            urlencoding::encode(username)
        );
    }

    /// A restored record must carry both halves of the credential pair.
    pub fn is_complete(&self) -> bool {
        return !self.username.trim().is_empty() && !self.session_token.trim().is_empty();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("Session")
            .field("username", &self.username)
            .field("session_token", &"<redacted>")
            .field("avatar_url", &self.avatar_url)
            .finish();
    }
}
