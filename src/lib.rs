pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod mqtt;
pub mod persist;
pub mod publish;
pub mod repositories;
pub mod routes;
pub mod state;

pub use config::Config;
pub use db::{create_pool, DbPool};
pub use error::{AppError, Result};

use publish::MqttPublisher;
use repositories::EventRepository;
use state::StateStore;

/// Everything the HTTP handlers need, injected through axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
    pub repo: EventRepository,
    pub publisher: MqttPublisher,
}
