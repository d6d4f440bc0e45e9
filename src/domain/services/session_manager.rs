#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use super::PersistentStore;
use crate::domain::models::NaveenaError;
use crate::domain::models::Session;

pub const SESSION_KEY: &str = "naveena_session";

pub struct SessionManager {
    store: PersistentStore,
    current: Option<Session>,
}

impl SessionManager {
    pub fn new(store: PersistentStore) -> SessionManager {
        return SessionManager {
            store,
            current: None,
        };
    }

    pub fn current(&self) -> Option<&Session> {
        return self.current.as_ref();
    }

    pub fn is_persisted(&self) -> bool {
        return self.store.is_available();
    }

    pub fn restore(&mut self) {
        self.current = None;

        let session = match self.store.get_json::<Session>(SESSION_KEY) {
            Some(session) => session,
            None => return,
        };

        if !session.is_complete() {
            tracing::warn!(
                error = %NaveenaError::Deserialization("session is missing its username or token".to_string()),
                "Ignoring stored session"
            );
            return;
        }

        tracing::debug!(username = session.username, "Restored session");
        self.current = Some(session);
    }

    /// The session becomes current even when it can't be written to disk; it
    /// just won't survive a restart.
    pub fn login(&mut self, username: &str, session_token: &str) -> Result<&Session, NaveenaError> {
        let session = Session::new(username, session_token)?;

        if let Err(err) = self.store.set_json(SESSION_KEY, &session) {
            tracing::warn!(error = %err, "Session kept in memory only");
        }

        tracing::info!(username = session.username, "Logged in");
        return Ok(self.current.insert(session));
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(username = session.username, "Logged out");
        }

        if let Err(err) = self.store.remove(SESSION_KEY) {
            tracing::warn!(error = %err, "Stored session could not be removed");
        }
    }
}
