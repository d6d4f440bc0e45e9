#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::models::NaveenaError;
use crate::domain::models::StoreBox;

/// Best-effort wrapper over a `Store`. Storage failures are logged and turned
/// into a degraded flag instead of propagating, so callers keep working on
/// their in-memory state. The flag clears on the next successful write.
#[derive(Clone)]
pub struct PersistentStore {
    backend: StoreBox,
    available: bool,
}

impl PersistentStore {
    pub fn new(backend: StoreBox) -> PersistentStore {
        return PersistentStore {
            backend,
            available: true,
        };
    }

    pub fn is_available(&self) -> bool {
        return self.available;
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => return value,
            Err(err) => {
                self.degrade(key, &err);
                return None;
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), NaveenaError> {
        if let Err(err) = self.backend.set(key, value) {
            return Err(self.degrade(key, &err));
        }

        self.recover(key);
        return Ok(());
    }

    pub fn remove(&mut self, key: &str) -> Result<(), NaveenaError> {
        if let Err(err) = self.backend.remove(key) {
            return Err(self.degrade(key, &err));
        }

        self.recover(key);
        return Ok(());
    }

    /// Reads and parses a record. Anything that doesn't parse into `T` is
    /// reported as absent.
    pub fn get_json<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let payload = self.get(key)?;

        match serde_json::from_str::<T>(&payload) {
            Ok(value) => return Some(value),
            Err(err) => {
                let err = NaveenaError::Deserialization(err.to_string());
                tracing::warn!(key = key, error = %err, "Ignoring stored record");
                return None;
            }
        }
    }

    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), NaveenaError> {
        let payload = serde_json::to_string(value)
            .map_err(|err| return NaveenaError::Persistence(err.to_string()))?;

        return self.set(key, &payload);
    }

    fn degrade(&mut self, key: &str, err: &anyhow::Error) -> NaveenaError {
        if self.available {
            tracing::warn!(key = key, error = ?err, "Persistence unavailable, keeping state in memory");
        } else {
            tracing::debug!(key = key, error = ?err, "Persistence still unavailable");
        }

        self.available = false;
        return NaveenaError::Persistence(format!("{err:#}"));
    }

    fn recover(&mut self, key: &str) {
        if !self.available {
            tracing::info!(key = key, "Persistence available again");
        }

        self.available = true;
    }
}
