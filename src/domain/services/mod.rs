mod debounce;
pub mod events;
mod history_store;
mod orchestrator;
mod persistence;
mod session_manager;

pub use debounce::*;
pub use history_store::*;
pub use orchestrator::*;
pub use persistence::*;
pub use session_manager::*;
