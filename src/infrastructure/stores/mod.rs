pub mod file;
pub mod memory;

use std::sync::Arc;

use crate::domain::models::StoreBox;
use crate::domain::models::StoreName;

pub struct StoreManager {}

impl StoreManager {
    pub fn get(name: StoreName) -> StoreBox {
        match name {
            StoreName::File => return Arc::<file::FileStore>::default(),
            StoreName::Memory => return Arc::<memory::MemoryStore>::default(),
        }
    }
}
