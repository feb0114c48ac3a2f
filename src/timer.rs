use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

/// Handle for a scheduled one-shot timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// One-shot timer capability provided by the host event loop.
///
/// Expiry is reported back by the host (see [`crate::Controller::on_timer`]); the queue
/// itself never calls into user code.
pub trait TimerQueue {
    fn schedule_once(&mut self, after: Duration) -> TimerId;

    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, timer: TimerId) -> bool;

    fn pending(&self) -> usize;
}

/// Timers driven by a manually advanced clock, for deterministic tests and replay.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    next_id: u64,
    deadlines: BTreeMap<TimerId, Duration>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Advance the clock and return the timers that expired, earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<TimerId> {
        self.now += by;
        let now = self.now;
        take_expired(&mut self.deadlines, |deadline| deadline <= now)
    }
}

impl TimerQueue for ManualTimers {
    fn schedule_once(&mut self, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.deadlines.insert(id, self.now + after);
        id
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        self.deadlines.remove(&timer).is_some()
    }

    fn pending(&self) -> usize {
        self.deadlines.len()
    }
}

/// Wall-clock timers for a single-threaded host loop.
#[derive(Debug, Default)]
pub struct DeadlineTimers {
    next_id: u64,
    deadlines: BTreeMap<TimerId, Instant>,
}

impl DeadlineTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return the timers due at `now`, earliest first.
    pub fn expired(&mut self, now: Instant) -> Vec<TimerId> {
        take_expired(&mut self.deadlines, |deadline| deadline <= now)
    }
}

impl TimerQueue for DeadlineTimers {
    fn schedule_once(&mut self, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.deadlines.insert(id, Instant::now() + after);
        id
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        self.deadlines.remove(&timer).is_some()
    }

    fn pending(&self) -> usize {
        self.deadlines.len()
    }
}

fn take_expired<T: Copy + Ord>(
    deadlines: &mut BTreeMap<TimerId, T>,
    is_due: impl Fn(T) -> bool,
) -> Vec<TimerId> {
    let mut due: Vec<(T, TimerId)> = deadlines
        .iter()
        .filter(|&(_, &deadline)| is_due(deadline))
        .map(|(&id, &deadline)| (deadline, id))
        .collect();
    due.sort();
    for (_, id) in &due {
        deadlines.remove(id);
    }
    due.into_iter().map(|(_, id)| id).collect()
}
