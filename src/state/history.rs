use crate::models::StateSnapshot;

pub const HISTORY_CAPACITY: usize = 100;

/// Bounded, overwrite-oldest buffer of recent state snapshots, for recall
/// without a storage round trip. Shares the state store's lock; it is never
/// touched outside that critical section.
#[derive(Debug)]
pub struct HistoryRing {
    slots: Vec<Option<StateSnapshot>>,
    /// Next slot to write.
    index: usize,
    count: usize,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            index: 0,
            count: 0,
        }
    }

    pub fn append(&mut self, snapshot: StateSnapshot) {
        self.slots[self.index] = Some(snapshot);
        self.index = (self.index + 1) % self.slots.len();
        if self.count < self.slots.len() {
            self.count += 1;
        }
    }

    /// The `min(k, count)` most recent snapshots, newest first, walking
    /// backward from the last-written slot.
    pub fn recent(&self, k: usize) -> Vec<StateSnapshot> {
        let capacity = self.slots.len();
        let n = k.min(self.count);
        let mut out = Vec::with_capacity(n);
        for back in 1..=n {
            let slot = (self.index + capacity - back) % capacity;
            if let Some(snap) = self.slots[slot] {
                out.push(snap);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}
