use std::sync::Arc;

use anyhow::Result;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// Synchronous key/value storage. Implementations report failures and leave
/// it to `PersistentStore` to decide how to degrade.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

pub type StoreBox = Arc<dyn Store + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StoreName {
    File,
    Memory,
}

impl StoreName {
    pub fn parse(text: String) -> Option<StoreName> {
        return StoreName::iter().find(|e| return e.to_string() == text);
    }
}
