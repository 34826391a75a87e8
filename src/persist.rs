use crate::error::AppError;
use crate::models::{CommandSource, StateSnapshot};
use crate::repositories::EventRepository;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Depth of the write-behind queue between the state store and the writer
/// task. A full queue drops events (logged) rather than blocking a commit.
pub const PERSIST_QUEUE_DEPTH: usize = 256;

/// One row to append to the event log. Copied by value out of the store's
/// critical section; nothing here aliases live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistEvent {
    Command {
        pump_id: i64,
        command: i64,
        timestamp: i64,
        source: CommandSource,
    },
    Feedback {
        pump_id: i64,
        status: i64,
        timestamp: i64,
    },
    Heartbeat {
        device_id: String,
        firmware: String,
        status: i64,
        timestamp: i64,
    },
    Snapshot(StateSnapshot),
}

pub fn channel() -> (mpsc::Sender<PersistEvent>, mpsc::Receiver<PersistEvent>) {
    mpsc::channel(PERSIST_QUEUE_DEPTH)
}

/// Drain the queue into the repository. A failed write is logged and the
/// event dropped: the in-memory state is the operational source of truth
/// and the log is best-effort history.
pub fn spawn_writer(
    repo: EventRepository,
    mut rx: mpsc::Receiver<PersistEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = write_event(&repo, &event).await {
                error!(error = %e, "persist write failed");
            }
        }
        debug!("persist queue closed; writer exiting");
    })
}

async fn write_event(repo: &EventRepository, event: &PersistEvent) -> Result<(), AppError> {
    match event {
        PersistEvent::Command {
            pump_id,
            command,
            timestamp,
            source,
        } => {
            repo.insert_command(*pump_id, *command, *timestamp, source.as_str())
                .await
        }
        PersistEvent::Feedback {
            pump_id,
            status,
            timestamp,
        } => repo.insert_feedback(*pump_id, *status, *timestamp).await,
        PersistEvent::Heartbeat {
            device_id,
            firmware,
            status,
            timestamp,
        } => {
            repo.insert_heartbeat(device_id, firmware, *status, *timestamp)
                .await
        }
        PersistEvent::Snapshot(snapshot) => repo.insert_snapshot(snapshot).await,
    }
}

/// Daily sweep deleting snapshots older than the retention window.
pub async fn run_retention(repo: EventRepository, retention_days: u32) {
    let mut ticker = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
    loop {
        ticker.tick().await;
        let cutoff = chrono::Utc::now().timestamp() - i64::from(retention_days) * 86_400;
        match repo.delete_snapshots_older_than(cutoff).await {
            Ok(deleted) if deleted > 0 => {
                info!(deleted, retention_days, "retention sweep removed old snapshots");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "retention sweep failed"),
        }
    }
}
