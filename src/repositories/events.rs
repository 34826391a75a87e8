use crate::db::DbPool;
use crate::error::Result;
use crate::models::StateSnapshot;
use sqlx::Row;

/// Bounds for the snapshot history query. `from`/`to` are inclusive unix
/// seconds; `limit` is already clamped by the handler.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub limit: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Clone)]
pub struct EventRepository {
    pool: DbPool,
}

impl EventRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert_command(
        &self,
        pump_id: i64,
        command: i64,
        timestamp: i64,
        source: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO pump_commands (pump_id, command, timestamp, source) VALUES (?, ?, ?, ?)",
        )
        .bind(pump_id)
        .bind(command)
        .bind(timestamp)
        .bind(source)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_feedback(&self, pump_id: i64, status: i64, timestamp: i64) -> Result<()> {
        sqlx::query("INSERT INTO pump_feedback (pump_id, status, timestamp) VALUES (?, ?, ?)")
            .bind(pump_id)
            .bind(status)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_heartbeat(
        &self,
        device_id: &str,
        firmware: &str,
        status: i64,
        timestamp: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO gateway_heartbeats (device_id, firmware, status, timestamp) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(device_id)
        .bind(firmware)
        .bind(status)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_snapshot(&self, snapshot: &StateSnapshot) -> Result<()> {
        sqlx::query(
            "INSERT INTO pump_snapshots \
             (pump1_cmd, pump1_status, pump2_cmd, pump2_status, busy, alarm, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(snapshot.pump1)
        .bind(snapshot.pump1_status)
        .bind(snapshot.pump2)
        .bind(snapshot.pump2_status)
        .bind(snapshot.busy)
        .bind(snapshot.alarm)
        .bind(snapshot.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Snapshots within the optional time bounds, newest first. Rows carry
    /// their own timestamps, so ordering by timestamp here is what makes the
    /// write-behind log's relaxed write ordering invisible to readers.
    pub async fn snapshot_history(&self, params: &HistoryQuery) -> Result<Vec<StateSnapshot>> {
        let mut query = String::from(
            "SELECT pump1_cmd, pump1_status, pump2_cmd, pump2_status, busy, alarm, timestamp \
             FROM pump_snapshots WHERE 1=1",
        );

        if params.from.is_some() {
            query.push_str(" AND timestamp >= ?");
        }
        if params.to.is_some() {
            query.push_str(" AND timestamp <= ?");
        }
        query.push_str(" ORDER BY timestamp DESC LIMIT ?");

        let mut sql_query = sqlx::query(&query);
        if let Some(from) = params.from {
            sql_query = sql_query.bind(from);
        }
        if let Some(to) = params.to {
            sql_query = sql_query.bind(to);
        }
        sql_query = sql_query.bind(params.limit);

        let rows = sql_query.fetch_all(&self.pool).await?;

        let snapshots = rows
            .iter()
            .map(|row| StateSnapshot {
                pump1: row.get("pump1_cmd"),
                pump1_status: row.get("pump1_status"),
                pump2: row.get("pump2_cmd"),
                pump2_status: row.get("pump2_status"),
                busy: row.get("busy"),
                alarm: row.get("alarm"),
                timestamp: row.get("timestamp"),
            })
            .collect();

        Ok(snapshots)
    }

    pub async fn count_commands(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pump_commands")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("count"))
    }

    pub async fn delete_snapshots_older_than(&self, cutoff: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pump_snapshots WHERE timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
