use crate::config::TopicsConfig;
use crate::error::Result;
use crate::models::{Busy, CommandSource, FeedbackStatus, PumpId};
use crate::state::StateStore;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct HeartbeatPayload {
    device_id: Option<String>,
    firmware: Option<String>,
    /// Defaults to 1 (online) when the device omits it.
    status: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ControlPayload {
    pump_id: i64,
    state: i64,
}

#[derive(Debug, Deserialize)]
struct FeedbackPayload {
    pump_id: i64,
    status: i64,
    busy: Option<i64>,
    alarm: Option<i64>,
}

/// Translates inbound broker payloads into state store operations. Each
/// decoded message maps to exactly one store call per affected record.
/// Malformed payloads produce an error that the caller logs and drops;
/// they never crash the loop or leave a partial update behind.
pub struct Ingestor {
    store: StateStore,
    topics: TopicsConfig,
}

impl Ingestor {
    pub fn new(store: StateStore, topics: TopicsConfig) -> Self {
        Self { store, topics }
    }

    pub fn handle_message(&self, topic: &str, payload: &[u8]) -> Result<()> {
        if topic == self.topics.heartbeat {
            self.handle_heartbeat(payload)
        } else if topic == self.topics.control {
            self.handle_control(payload)
        } else if topic == self.topics.feedback {
            self.handle_feedback(payload)
        } else {
            debug!(topic = %topic, "unhandled topic");
            Ok(())
        }
    }

    fn handle_heartbeat(&self, payload: &[u8]) -> Result<()> {
        let msg: HeartbeatPayload = serde_json::from_slice(payload)?;
        self.store.record_heartbeat(
            msg.device_id.as_deref(),
            msg.firmware.as_deref(),
            msg.status.unwrap_or(1),
        );
        Ok(())
    }

    fn handle_control(&self, payload: &[u8]) -> Result<()> {
        let msg: ControlPayload = serde_json::from_slice(payload)?;
        let pump = PumpId::try_from(msg.pump_id)?;
        self.store
            .set_pump_command(pump, msg.state != 0, CommandSource::Mqtt);
        Ok(())
    }

    fn handle_feedback(&self, payload: &[u8]) -> Result<()> {
        let msg: FeedbackPayload = serde_json::from_slice(payload)?;
        let pump = PumpId::try_from(msg.pump_id)?;
        self.store
            .set_pump_feedback(pump, FeedbackStatus::from_wire(msg.status));

        // busy and alarm ride along on feedback messages; each is validated
        // on its own so one bad field does not discard the other.
        let busy = msg.busy.and_then(|v| match Busy::try_from(v) {
            Ok(b) => Some(b),
            Err(e) => {
                warn!(error = %e, "ignoring invalid busy value");
                None
            }
        });
        let alarm = msg.alarm.and_then(|v| match v {
            0 => Some(false),
            1 => Some(true),
            other => {
                warn!(value = other, "ignoring invalid alarm value");
                None
            }
        });
        if busy.is_some() || alarm.is_some() {
            let current = self.store.pump_status();
            self.store.set_system_flags(
                busy.unwrap_or(current.busy),
                alarm.unwrap_or(current.alarm),
            );
        }
        Ok(())
    }
}
