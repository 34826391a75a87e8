use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

pub type DbPool = Pool<Sqlite>;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS pump_commands (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pump_id INTEGER NOT NULL,
        command INTEGER NOT NULL,
        timestamp INTEGER NOT NULL,
        source TEXT NOT NULL DEFAULT 'api'
    )",
    "CREATE TABLE IF NOT EXISTS pump_feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pump_id INTEGER NOT NULL,
        status INTEGER NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS gateway_heartbeats (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id TEXT NOT NULL,
        firmware TEXT NOT NULL,
        status INTEGER NOT NULL,
        timestamp INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pump_snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pump1_cmd INTEGER NOT NULL DEFAULT 0,
        pump1_status INTEGER NOT NULL DEFAULT 0,
        pump2_cmd INTEGER NOT NULL DEFAULT 0,
        pump2_status INTEGER NOT NULL DEFAULT 0,
        busy INTEGER NOT NULL DEFAULT 0,
        alarm INTEGER NOT NULL DEFAULT 0,
        timestamp INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_commands_time ON pump_commands(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_feedback_time ON pump_feedback(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_heartbeats_time ON gateway_heartbeats(timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_snapshots_time ON pump_snapshots(timestamp)",
];

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.unwrap_or(5))
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn init_schema(pool: &DbPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
