#[cfg(test)]
#[path = "history_store_test.rs"]
mod tests;

use chrono::Utc;

use super::PersistentStore;
use crate::domain::models::AnalysisResult;
use crate::domain::models::HistoryItem;
use crate::domain::models::HistoryKind;
use crate::domain::models::HistoryStats;
use crate::domain::models::NaveenaError;
use crate::domain::models::Replay;

pub const HISTORY_KEY: &str = "naveena_history";

/// Newest-first log of committed analyses. Entries are never edited or removed
/// one by one, and the whole sequence is re-persisted after every mutation.
pub struct HistoryStore {
    store: PersistentStore,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    pub fn new(store: PersistentStore) -> HistoryStore {
        return HistoryStore {
            store,
            items: vec![],
        };
    }

    pub fn items(&self) -> &[HistoryItem] {
        return &self.items;
    }

    pub fn len(&self) -> usize {
        return self.items.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.items.is_empty();
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        return self.items.iter().find(|e| return e.id == id);
    }

    pub fn is_persisted(&self) -> bool {
        return self.store.is_available();
    }

    pub fn stats(&self) -> HistoryStats {
        return HistoryStats::from_items(&self.items);
    }

    pub fn restore(&mut self) {
        self.items = vec![];

        let items = match self.store.get_json::<Vec<HistoryItem>>(HISTORY_KEY) {
            Some(items) => items,
            None => return,
        };

        if let Some(bad) = items.iter().find(|e| return !e.is_consistent()) {
            tracing::warn!(
                id = bad.id,
                error = %NaveenaError::Deserialization(format!("entry type {} does not match its result", bad.kind)),
                "Ignoring stored history"
            );
            return;
        }

        tracing::debug!(count = items.len(), "Restored history");
        self.items = items;
    }

    pub fn append(
        &mut self,
        kind: HistoryKind,
        source: &str,
        result: AnalysisResult,
    ) -> Result<&HistoryItem, NaveenaError> {
        if kind != result.kind() {
            return Err(NaveenaError::Validation(format!(
                "Cannot record a {} result as a {kind} entry.",
                result.kind()
            )));
        }

        let now = Utc::now().timestamp_millis();
        let item = HistoryItem::new(self.next_id(now), now, source, result);
        self.items.insert(0, item);
        self.persist();

        return Ok(&self.items[0]);
    }

    pub fn clear(&mut self) {
        self.items.clear();

        if let Err(err) = self.store.remove(HISTORY_KEY) {
            tracing::warn!(error = %err, "Stored history could not be removed");
        }
    }

    pub fn replay(item: &HistoryItem) -> Replay {
        return Replay::from(item);
    }

    /// Ids are epoch milliseconds, bumped past the newest entry when the clock
    /// hasn't moved (or moved backwards) so they stay unique and ordered.
    fn next_id(&self, now: i64) -> String {
        let newest = self
            .items
            .first()
            .and_then(|e| return e.id.parse::<i64>().ok());

        match newest {
            Some(newest) if newest >= now => {
                return newest.checked_add(1).unwrap_or(now).to_string();
            }
            _ => return now.to_string(),
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.set_json(HISTORY_KEY, &self.items) {
            tracing::warn!(error = %err, count = self.items.len(), "History kept in memory only");
        }
    }
}
