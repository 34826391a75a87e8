// State store properties exercised through the public API. Persistence is
// observed by holding the receiving end of the write-behind queue.

use pretty_assertions::assert_eq;
use pump_gateway::models::{Busy, CommandSource, FeedbackStatus, PumpId};
use pump_gateway::persist::PersistEvent;
use pump_gateway::state::StateStore;
use tokio::sync::mpsc;

fn store_with_rx() -> (StateStore, mpsc::Receiver<PersistEvent>) {
    let (tx, rx) = mpsc::channel(1024);
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
fn reads_reflect_most_recent_completed_write() {
    let (store, _rx) = store_with_rx();
    store.set_pump_command(PumpId::Pump1, true, CommandSource::Api);
    store.set_pump_command(PumpId::Pump2, true, CommandSource::Api);
    store.set_pump_command(PumpId::Pump1, false, CommandSource::Api);

    let state = store.pump_status();
    assert!(!state.commands[0]);
    assert!(state.commands[1]);
}

#[test]
fn repeated_command_commits_exactly_once() {
    let (store, mut rx) = store_with_rx();

    let first = store.set_pump_command(PumpId::Pump1, true, CommandSource::Api);
    assert!(first.significant);

    let second = store.set_pump_command(PumpId::Pump1, true, CommandSource::Api);
    assert!(!second.significant);

    // One command event and one snapshot, nothing from the repeat.
    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PersistEvent::Command { pump_id: 1, command: 1, .. }));
    assert!(matches!(events[1], PersistEvent::Snapshot(_)));
    assert_eq!(store.history_len(), 1);
}

#[test]
fn ring_holds_last_hundred_of_150_commits() {
    let (store, _rx) = store_with_rx();
    // Alternating values so every commit is significant.
    for i in 0..150 {
        store.set_pump_command(PumpId::Pump1, i % 2 == 0, CommandSource::Api);
    }
    assert_eq!(store.history_len(), 100);

    let recent = store.recent_history(100);
    assert_eq!(recent.len(), 100);
    // Newest first: commit 149 wrote pump1=0, 148 wrote pump1=1, ...
    for (offset, snap) in recent.iter().enumerate() {
        let commit_index = 149 - offset as i64;
        assert_eq!(snap.pump1, i64::from(commit_index % 2 == 0));
    }
    // Asking for more than the ring holds returns only what survives.
    assert_eq!(store.recent_history(150).len(), 100);
}

#[test]
fn out_of_range_feedback_clamps_to_unknown() {
    let (store, _rx) = store_with_rx();
    store.set_pump_feedback(PumpId::Pump1, FeedbackStatus::from_wire(99));
    assert_eq!(store.pump_status().feedback[0], FeedbackStatus::Unknown);
    assert_eq!(store.snapshot().pump1_status, 0);
}

#[test]
fn history_counts_track_significant_commits_only() {
    let (store, _rx) = store_with_rx();
    assert_eq!(store.history_len(), 0);

    let commit = store.set_pump_command(PumpId::Pump1, true, CommandSource::Api);
    assert!(commit.significant);
    assert!(store.pump_status().commands[0]);
    assert_eq!(store.history_len(), 1);

    let commit = store.set_system_flags(Busy::StartingPump1, false);
    assert!(commit.significant);
    assert_eq!(store.history_len(), 2);

    // Same flags again: nothing changed, history stays put.
    let commit = store.set_system_flags(Busy::StartingPump1, false);
    assert!(!commit.significant);
    assert_eq!(store.history_len(), 2);
}

#[test]
fn alarm_and_busy_are_tracked_independently() {
    let (store, _rx) = store_with_rx();
    store.set_system_flags(Busy::Idle, false);

    // Only the alarm moves; that alone is a commit.
    let commit = store.set_system_flags(Busy::Idle, true);
    assert!(commit.significant);
    let state = store.pump_status();
    assert_eq!(state.busy, Busy::Idle);
    assert!(state.alarm);
}

#[test]
fn concurrent_writers_land_one_consistent_value_per_field() {
    let (store, _rx) = store_with_rx();

    let s1 = store.clone();
    let t1 = std::thread::spawn(move || {
        for i in 0..200 {
            s1.set_pump_command(PumpId::Pump1, i % 2 == 0, CommandSource::Api);
        }
        s1.set_pump_command(PumpId::Pump1, true, CommandSource::Api);
    });
    let s2 = store.clone();
    let t2 = std::thread::spawn(move || {
        for i in 0..200i64 {
            s2.set_pump_feedback(PumpId::Pump2, FeedbackStatus::from_wire(i % 4));
        }
        s2.set_pump_feedback(PumpId::Pump2, FeedbackStatus::Running);
    });
    t1.join().unwrap();
    t2.join().unwrap();

    let state = store.pump_status();
    assert!(state.commands[0]);
    assert_eq!(state.feedback[1], FeedbackStatus::Running);
    assert_eq!(store.history_len(), 100);
}
