mod analysis;
mod error;
mod event;
mod gateway;
mod history;
mod loading;
mod session;
mod store;
mod textarea;
mod view;

pub use analysis::*;
pub use error::*;
pub use event::*;
pub use gateway::*;
pub use history::*;
pub use loading::*;
pub use session::*;
pub use store::*;
pub use textarea::*;
pub use view::*;
