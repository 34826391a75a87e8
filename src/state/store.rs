use crate::models::gateway::{truncate_to, DEVICE_ID_MAX, FIRMWARE_MAX};
use crate::models::{
    Busy, CommandSource, Commit, FeedbackStatus, GatewayLiveness, PumpId, PumpState, StateSnapshot,
};
use crate::persist::PersistEvent;
use crate::state::baseline::ChangeBaseline;
use crate::state::history::HistoryRing;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Single source of truth for current hardware/command state.
///
/// One mutex guards the state record, the change baseline and the history
/// ring: a significant commit mutates all three in one critical section, so
/// readers always see a full pre- or post-commit view. Persistence writes are
/// enqueued after the lock is released and drained by the writer task; a
/// slow or failed write never blocks reads or rolls back the in-memory
/// commit.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Mutex<Inner>>,
    persist_tx: mpsc::Sender<PersistEvent>,
}

#[derive(Debug)]
struct Inner {
    pump: PumpState,
    gateway: GatewayLiveness,
    baseline: ChangeBaseline,
    history: HistoryRing,
}

impl StateStore {
    pub fn new(persist_tx: mpsc::Sender<PersistEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                pump: PumpState::default(),
                gateway: GatewayLiveness::default(),
                baseline: ChangeBaseline::default(),
                history: HistoryRing::new(),
            })),
            persist_tx,
        }
    }

    pub fn set_pump_command(&self, pump: PumpId, on: bool, source: CommandSource) -> Commit {
        self.set_pump_command_at(pump, on, source, Utc::now().timestamp())
    }

    fn set_pump_command_at(
        &self,
        pump: PumpId,
        on: bool,
        source: CommandSource,
        now: i64,
    ) -> Commit {
        let mut events = Vec::new();
        let commit = {
            let mut inner = self.inner.lock().unwrap();
            inner.pump.commands[pump.index()] = on;
            inner.pump.last_updated = now;
            if inner.baseline.command_changed(pump, on) {
                inner.baseline.commit_command(pump, on);
                let snapshot = inner.pump.snapshot();
                inner.history.append(snapshot);
                events.push(PersistEvent::Command {
                    pump_id: pump.as_i64(),
                    command: on as i64,
                    timestamp: now,
                    source,
                });
                events.push(PersistEvent::Snapshot(snapshot));
                Commit { significant: true }
            } else {
                Commit { significant: false }
            }
        };
        self.enqueue(events);
        if commit.significant {
            debug!(pump = %pump, on, "pump command committed");
        }
        commit
    }

    pub fn set_pump_feedback(&self, pump: PumpId, status: FeedbackStatus) -> Commit {
        self.set_pump_feedback_at(pump, status, Utc::now().timestamp())
    }

    fn set_pump_feedback_at(&self, pump: PumpId, status: FeedbackStatus, now: i64) -> Commit {
        let mut events = Vec::new();
        let commit = {
            let mut inner = self.inner.lock().unwrap();
            inner.pump.feedback[pump.index()] = status;
            inner.pump.last_updated = now;
            if inner.baseline.feedback_changed(pump, status) {
                inner.baseline.commit_feedback(pump, status);
                let snapshot = inner.pump.snapshot();
                inner.history.append(snapshot);
                events.push(PersistEvent::Feedback {
                    pump_id: pump.as_i64(),
                    status: status.as_i64(),
                    timestamp: now,
                });
                events.push(PersistEvent::Snapshot(snapshot));
                Commit { significant: true }
            } else {
                Commit { significant: false }
            }
        };
        self.enqueue(events);
        commit
    }

    /// Significance is evaluated independently for `busy` and `alarm`; a
    /// commit happens if either changed.
    pub fn set_system_flags(&self, busy: Busy, alarm: bool) -> Commit {
        self.set_system_flags_at(busy, alarm, Utc::now().timestamp())
    }

    fn set_system_flags_at(&self, busy: Busy, alarm: bool, now: i64) -> Commit {
        let mut events = Vec::new();
        let commit = {
            let mut inner = self.inner.lock().unwrap();
            inner.pump.busy = busy;
            inner.pump.alarm = alarm;
            inner.pump.last_updated = now;
            let busy_changed = inner.baseline.busy_changed(busy);
            let alarm_changed = inner.baseline.alarm_changed(alarm);
            if busy_changed {
                inner.baseline.commit_busy(busy);
            }
            if alarm_changed {
                inner.baseline.commit_alarm(alarm);
            }
            if busy_changed || alarm_changed {
                let snapshot = inner.pump.snapshot();
                inner.history.append(snapshot);
                events.push(PersistEvent::Snapshot(snapshot));
                Commit { significant: true }
            } else {
                Commit { significant: false }
            }
        };
        self.enqueue(events);
        commit
    }

    /// `last_seen` is refreshed on every call, even a redundant one, but a
    /// heartbeat event is only persisted when significant:
    /// first heartbeat, changed status or firmware, or the gateway had been
    /// offline for the full timeout before this heartbeat arrived. Absent
    /// `device_id`/`firmware` keep the last reported value.
    pub fn record_heartbeat(
        &self,
        device_id: Option<&str>,
        firmware: Option<&str>,
        status: i64,
    ) -> Commit {
        self.record_heartbeat_at(device_id, firmware, status, Utc::now().timestamp())
    }

    fn record_heartbeat_at(
        &self,
        device_id: Option<&str>,
        firmware: Option<&str>,
        status: i64,
        now: i64,
    ) -> Commit {
        let mut events = Vec::new();
        let commit = {
            let mut inner = self.inner.lock().unwrap();
            let device_id = device_id
                .map(|s| truncate_to(s, DEVICE_ID_MAX))
                .unwrap_or_else(|| inner.gateway.device_id.clone());
            let firmware = firmware
                .map(|s| truncate_to(s, FIRMWARE_MAX))
                .unwrap_or_else(|| inner.gateway.firmware.clone());
            let was_online = inner.gateway.is_online_at(now);
            let significant =
                !was_online || inner.baseline.heartbeat_changed(status, &firmware);
            inner.gateway.status = status;
            inner.gateway.last_seen = now;
            inner.gateway.device_id = device_id.clone();
            inner.gateway.firmware = firmware.clone();
            if significant {
                inner.baseline.commit_heartbeat(status, &firmware);
                events.push(PersistEvent::Heartbeat {
                    device_id: device_id.clone(),
                    firmware: firmware.clone(),
                    status,
                    timestamp: now,
                });
            }
            debug!(device_id = %device_id, firmware = %firmware, significant, "gateway heartbeat");
            Commit { significant }
        };
        self.enqueue(events);
        commit
    }

    /// Value copy of the current pump state. Never blocks beyond the copy.
    pub fn pump_status(&self) -> PumpState {
        self.inner.lock().unwrap().pump.clone()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().unwrap().pump.snapshot()
    }

    pub fn gateway_status(&self) -> GatewayLiveness {
        self.inner.lock().unwrap().gateway.clone()
    }

    /// The `min(k, count)` most recent significant-commit snapshots, newest
    /// first, without touching storage.
    pub fn recent_history(&self, k: usize) -> Vec<StateSnapshot> {
        self.inner.lock().unwrap().history.recent(k)
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().unwrap().history.len()
    }

    fn enqueue(&self, events: Vec<PersistEvent>) {
        for event in events {
            if let Err(e) = self.persist_tx.try_send(event) {
                warn!(error = %e, "persist queue full; dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::PersistEvent;

    fn store_with_rx() -> (StateStore, mpsc::Receiver<PersistEvent>) {
        let (tx, rx) = mpsc::channel(64);
        (StateStore::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<PersistEvent>) -> Vec<PersistEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn first_heartbeat_is_significant() {
        let (store, mut rx) = store_with_rx();
        let commit = store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1000);
        assert!(commit.significant);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PersistEvent::Heartbeat { .. }));
    }

    #[test]
    fn unchanged_heartbeat_within_timeout_is_redundant() {
        let (store, mut rx) = store_with_rx();
        store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1000);
        drain(&mut rx);

        let commit = store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1010);
        assert!(!commit.significant);
        assert!(drain(&mut rx).is_empty());

        // last_seen was still refreshed by the redundant heartbeat.
        let gateway = store.gateway_status();
        assert_eq!(gateway.last_seen, 1010);
        assert!(gateway.is_online_at(1035));
    }

    #[test]
    fn heartbeat_after_offline_gap_is_significant() {
        let (store, _rx) = store_with_rx();
        store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1000);
        // 45s gap: the gateway had gone offline before this one arrived.
        let commit = store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1045);
        assert!(commit.significant);
    }

    #[test]
    fn status_or_firmware_change_is_significant() {
        let (store, _rx) = store_with_rx();
        store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1000);
        assert!(store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 2, 1005).significant);
        assert!(store.record_heartbeat_at(Some("esp32-01"), Some("1.0.1"), 2, 1010).significant);
        assert!(!store.record_heartbeat_at(Some("esp32-01"), Some("1.0.1"), 2, 1015).significant);
    }

    #[test]
    fn heartbeat_truncates_reported_strings() {
        let (store, _rx) = store_with_rx();
        let long_id = "x".repeat(100);
        let long_fw = "y".repeat(50);
        store.record_heartbeat_at(Some(&long_id), Some(&long_fw), 1, 1000);
        let gateway = store.gateway_status();
        assert_eq!(gateway.device_id.chars().count(), DEVICE_ID_MAX);
        assert_eq!(gateway.firmware.chars().count(), FIRMWARE_MAX);
    }

    #[test]
    fn redundant_command_still_refreshes_last_updated() {
        let (store, _rx) = store_with_rx();
        store.set_pump_command_at(PumpId::Pump1, true, CommandSource::Api, 1000);
        let commit = store.set_pump_command_at(PumpId::Pump1, true, CommandSource::Api, 1010);
        assert!(!commit.significant);
        let state = store.pump_status();
        assert!(state.commands[0]);
        assert_eq!(state.last_updated, 1010);
        // The redundant call appended nothing.
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn heartbeats_do_not_touch_pump_history() {
        let (store, _rx) = store_with_rx();
        store.record_heartbeat_at(Some("esp32-01"), Some("1.0.0"), 1, 1000);
        assert_eq!(store.history_len(), 0);
    }
}
