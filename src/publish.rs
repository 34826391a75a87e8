use crate::error::{AppError, Result};
use crate::models::StateSnapshot;
use crate::mqtt::{AsyncClient, QoS};
use crate::state::StateStore;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Outbound side of the broker connection: the retained status re-publish
/// and the control-topic forward used by the HTTP control endpoint.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    status_topic: String,
    control_topic: String,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient, status_topic: String, control_topic: String) -> Self {
        Self {
            client,
            status_topic,
            control_topic,
        }
    }

    /// Retained so late subscribers see the last known state immediately.
    pub async fn publish_status(&self, snapshot: &StateSnapshot) -> Result<()> {
        let payload = serde_json::to_vec(snapshot)?;
        self.client
            .publish(self.status_topic.clone(), QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
    }

    pub async fn publish_control(&self, pump_id: i64, state: i64) -> Result<()> {
        let payload = serde_json::to_vec(&json!({ "pump_id": pump_id, "state": state }))?;
        self.client
            .publish(self.control_topic.clone(), QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| AppError::Transport(e.to_string()))
    }
}

/// Re-broadcast the current state on a fixed interval until shutdown.
pub async fn run_status_publisher(
    publisher: MqttPublisher,
    store: StateStore,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let snapshot = store.snapshot();
        match publisher.publish_status(&snapshot).await {
            Ok(()) => debug!(timestamp = snapshot.timestamp, "published status"),
            Err(e) => warn!(error = %e, "status publish failed"),
        }
    }
}
