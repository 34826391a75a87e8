pub mod baseline;
pub mod history;
pub mod store;

pub use baseline::ChangeBaseline;
pub use history::{HistoryRing, HISTORY_CAPACITY};
pub use store::StateStore;
