use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PUMP_COUNT: usize = 2;

/// Identifier of one of the controllable pumps. Wire payloads carry these as
/// integers 1 and 2; anything else is rejected at the conversion boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PumpId {
    Pump1,
    Pump2,
}

impl PumpId {
    pub const ALL: [PumpId; PUMP_COUNT] = [PumpId::Pump1, PumpId::Pump2];

    pub fn index(self) -> usize {
        match self {
            PumpId::Pump1 => 0,
            PumpId::Pump2 => 1,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            PumpId::Pump1 => 1,
            PumpId::Pump2 => 2,
        }
    }
}

impl TryFrom<i64> for PumpId {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PumpId::Pump1),
            2 => Ok(PumpId::Pump2),
            other => Err(AppError::InvalidTarget(other)),
        }
    }
}

impl fmt::Display for PumpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Hardware feedback reported for a pump. Out-of-range wire values clamp to
/// `Unknown` instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackStatus {
    #[default]
    Unknown,
    Running,
    Stopped,
    Error,
}

impl FeedbackStatus {
    pub fn from_wire(value: i64) -> Self {
        match value {
            1 => FeedbackStatus::Running,
            2 => FeedbackStatus::Stopped,
            3 => FeedbackStatus::Error,
            _ => FeedbackStatus::Unknown,
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            FeedbackStatus::Unknown => 0,
            FeedbackStatus::Running => 1,
            FeedbackStatus::Stopped => 2,
            FeedbackStatus::Error => 3,
        }
    }
}

/// System-level activity flag. Mutually exclusive; out-of-range wire values
/// are invalid and dropped at the decode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Busy {
    #[default]
    Idle,
    StartingPump1,
    StartingPump2,
}

impl Busy {
    pub fn as_i64(self) -> i64 {
        match self {
            Busy::Idle => 0,
            Busy::StartingPump1 => 1,
            Busy::StartingPump2 => 2,
        }
    }
}

impl TryFrom<i64> for Busy {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Busy::Idle),
            1 => Ok(Busy::StartingPump1),
            2 => Ok(Busy::StartingPump2),
            other => Err(AppError::InvalidValue(format!(
                "busy must be 0-2, got {}",
                other
            ))),
        }
    }
}

/// Where a pump command originated, recorded with each persisted command row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Mqtt,
    Api,
}

impl CommandSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandSource::Mqtt => "mqtt",
            CommandSource::Api => "api",
        }
    }
}

/// Current hardware/command state. One instance lives behind the state
/// store's mutex; every mutation stamps `last_updated` in the same critical
/// section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpState {
    pub commands: [bool; PUMP_COUNT],
    pub feedback: [FeedbackStatus; PUMP_COUNT],
    pub busy: Busy,
    pub alarm: bool,
    pub last_updated: i64,
}

impl PumpState {
    /// By-value copy in the wire/persisted shape. No reference into the live
    /// record survives the call.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            pump1: self.commands[0] as i64,
            pump1_status: self.feedback[0].as_i64(),
            pump2: self.commands[1] as i64,
            pump2_status: self.feedback[1].as_i64(),
            busy: self.busy.as_i64(),
            alarm: self.alarm as i64,
            timestamp: self.last_updated,
        }
    }
}

/// Immutable copy of the pump state at one instant. This is the shape the
/// periodic publisher, the status endpoint, the history ring and the
/// snapshots table all share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub pump1: i64,
    pub pump1_status: i64,
    pub pump2: i64,
    pub pump2_status: i64,
    pub busy: i64,
    pub alarm: i64,
    pub timestamp: i64,
}

/// Outcome of a state-store mutation: whether the update differed from the
/// last committed baseline for its field-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub significant: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_id_accepts_known_ids_only() {
        assert_eq!(PumpId::try_from(1).unwrap(), PumpId::Pump1);
        assert_eq!(PumpId::try_from(2).unwrap(), PumpId::Pump2);
        assert!(matches!(
            PumpId::try_from(3),
            Err(AppError::InvalidTarget(3))
        ));
        assert!(matches!(
            PumpId::try_from(0),
            Err(AppError::InvalidTarget(0))
        ));
    }

    #[test]
    fn feedback_status_clamps_out_of_range_to_unknown() {
        assert_eq!(FeedbackStatus::from_wire(1), FeedbackStatus::Running);
        assert_eq!(FeedbackStatus::from_wire(3), FeedbackStatus::Error);
        assert_eq!(FeedbackStatus::from_wire(99), FeedbackStatus::Unknown);
        assert_eq!(FeedbackStatus::from_wire(-1), FeedbackStatus::Unknown);
    }

    #[test]
    fn busy_rejects_out_of_range() {
        assert_eq!(Busy::try_from(2).unwrap(), Busy::StartingPump2);
        assert!(Busy::try_from(3).is_err());
    }

    #[test]
    fn snapshot_copies_all_fields() {
        let state = PumpState {
            commands: [true, false],
            feedback: [FeedbackStatus::Running, FeedbackStatus::Stopped],
            busy: Busy::StartingPump1,
            alarm: true,
            last_updated: 1700000000,
        };
        let snap = state.snapshot();
        assert_eq!(snap.pump1, 1);
        assert_eq!(snap.pump1_status, 1);
        assert_eq!(snap.pump2, 0);
        assert_eq!(snap.pump2_status, 2);
        assert_eq!(snap.busy, 1);
        assert_eq!(snap.alarm, 1);
        assert_eq!(snap.timestamp, 1700000000);
    }
}
