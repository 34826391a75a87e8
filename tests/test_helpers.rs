use pump_gateway::db::{init_schema, DbPool};
use pump_gateway::models::StateSnapshot;
use pump_gateway::repositories::EventRepository;
use sqlx::sqlite::SqlitePoolOptions;

/// One-connection in-memory sqlite pool with the gateway schema applied.
/// A single connection keeps every query on the same in-memory database.
pub async fn create_test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    init_schema(&pool).await.expect("failed to apply schema");
    pool
}

pub fn snapshot_at(ts: i64) -> StateSnapshot {
    StateSnapshot {
        pump1: 1,
        pump1_status: 1,
        pump2: 0,
        pump2_status: 0,
        busy: 0,
        alarm: 0,
        timestamp: ts,
    }
}

pub async fn seed_snapshots(repo: &EventRepository, timestamps: &[i64]) {
    for &ts in timestamps {
        repo.insert_snapshot(&snapshot_at(ts))
            .await
            .expect("failed to seed snapshot");
    }
}
