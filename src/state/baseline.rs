use crate::models::{Busy, FeedbackStatus, PumpId, PUMP_COUNT};

/// Last committed value per tracked field-group. A slot is `None` until the
/// group's first commit, and only moves when the store decides to commit.
/// Redundant updates never touch it.
#[derive(Debug, Default)]
pub struct ChangeBaseline {
    commands: [Option<bool>; PUMP_COUNT],
    feedback: [Option<FeedbackStatus>; PUMP_COUNT],
    busy: Option<Busy>,
    alarm: Option<bool>,
    heartbeat: Option<HeartbeatBaseline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatBaseline {
    pub status: i64,
    pub firmware: String,
}

/// A value is significant when the group has no baseline yet or the new
/// value differs from it. Ties are never significant.
fn differs<T: PartialEq>(baseline: &Option<T>, new: &T) -> bool {
    baseline.as_ref() != Some(new)
}

impl ChangeBaseline {
    pub fn command_changed(&self, pump: PumpId, on: bool) -> bool {
        differs(&self.commands[pump.index()], &on)
    }

    pub fn commit_command(&mut self, pump: PumpId, on: bool) {
        self.commands[pump.index()] = Some(on);
    }

    pub fn feedback_changed(&self, pump: PumpId, status: FeedbackStatus) -> bool {
        differs(&self.feedback[pump.index()], &status)
    }

    pub fn commit_feedback(&mut self, pump: PumpId, status: FeedbackStatus) {
        self.feedback[pump.index()] = Some(status);
    }

    pub fn busy_changed(&self, busy: Busy) -> bool {
        differs(&self.busy, &busy)
    }

    pub fn commit_busy(&mut self, busy: Busy) {
        self.busy = Some(busy);
    }

    pub fn alarm_changed(&self, alarm: bool) -> bool {
        differs(&self.alarm, &alarm)
    }

    pub fn commit_alarm(&mut self, alarm: bool) {
        self.alarm = Some(alarm);
    }

    pub fn heartbeat_changed(&self, status: i64, firmware: &str) -> bool {
        match &self.heartbeat {
            None => true,
            Some(b) => b.status != status || b.firmware != firmware,
        }
    }

    pub fn commit_heartbeat(&mut self, status: i64, firmware: &str) {
        self.heartbeat = Some(HeartbeatBaseline {
            status,
            firmware: firmware.to_string(),
        });
    }
}
