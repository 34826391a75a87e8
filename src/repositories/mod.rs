pub mod events;

pub use events::{EventRepository, HistoryQuery};
