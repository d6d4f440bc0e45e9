use anyhow::Result;
use dashmap::DashMap;

use crate::domain::models::Store;

/// Keeps records for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, String>,
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        return Ok(self.records.get(key).map(|e| return e.value().to_string()));
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        return Ok(());
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records.remove(key);
        return Ok(());
    }
}
