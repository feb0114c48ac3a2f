use std::time::Duration;

use crate::{FigureHandle, PolysurfError, TimerId, TimerQueue};

/// Default delay between regeneration cycles in continuous mode.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3000);

/// One generate → evaluate → render pass, as seen by the scheduler.
pub trait Cycle {
    fn run_cycle(&mut self) -> Result<FigureHandle, PolysurfError>;

    /// Free whatever the last cycle left on screen.
    fn release(&mut self) -> Result<(), PolysurfError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Continuous,
    Terminated,
}

/// What happened to a cycle that was allowed to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered(FigureHandle),
    /// The parameters were unusable; nothing was plotted and the reason should be shown
    /// to the user.
    Skipped(String),
}

/// Idle/continuous regeneration state machine.
///
/// At most one timer is pending at any time: `start` arms it, each expiry re-arms it, and
/// `stop` or `shutdown` cancel it. Expiry is delivered by the host through `on_timer`.
#[derive(Debug)]
pub struct Scheduler<T: TimerQueue> {
    state: SchedulerState,
    pending: Option<TimerId>,
    interval: Duration,
    timers: T,
}

impl<T: TimerQueue> Scheduler<T> {
    pub fn new(timers: T, interval: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            pending: None,
            interval,
            timers,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Enter continuous mode: run one cycle now, then arm the timer.
    ///
    /// Returns `None` if already in continuous mode; nothing is re-armed in that case.
    pub fn start(
        &mut self,
        cycle: &mut impl Cycle,
    ) -> Result<Option<CycleOutcome>, PolysurfError> {
        match self.state {
            SchedulerState::Terminated => Err(PolysurfError::SchedulerTerminated),
            SchedulerState::Continuous => {
                log::debug!("Already in continuous mode");
                Ok(None)
            }
            SchedulerState::Idle => {
                let outcome = run_guarded(cycle)?;
                self.state = SchedulerState::Continuous;
                self.arm();
                log::info!("Continuous mode started ({:?} interval)", self.interval);
                Ok(Some(outcome))
            }
        }
    }

    /// Leave continuous mode, cancelling the pending timer.
    ///
    /// Returns whether the scheduler was running. The last figure stays displayed.
    pub fn stop(&mut self) -> Result<bool, PolysurfError> {
        match self.state {
            SchedulerState::Terminated => Err(PolysurfError::SchedulerTerminated),
            SchedulerState::Idle => Ok(false),
            SchedulerState::Continuous => {
                self.disarm();
                self.state = SchedulerState::Idle;
                log::info!("Continuous mode stopped");
                Ok(true)
            }
        }
    }

    /// Handle expiry of `timer`. Stale or unknown timers are ignored and yield `None`.
    ///
    /// A fatal cycle error leaves continuous mode: the scheduler is `Idle` with nothing
    /// armed, the same as a failed `start`, so the host can call `start` again.
    pub fn on_timer(
        &mut self,
        timer: TimerId,
        cycle: &mut impl Cycle,
    ) -> Result<Option<CycleOutcome>, PolysurfError> {
        if self.state == SchedulerState::Terminated {
            return Err(PolysurfError::SchedulerTerminated);
        }
        if self.state != SchedulerState::Continuous || self.pending != Some(timer) {
            log::debug!("Ignoring stale timer {}", timer.id());
            return Ok(None);
        }

        self.pending = None;
        let outcome = match run_guarded(cycle) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = SchedulerState::Idle;
                log::error!("Continuous mode stopped after a failed cycle: {e}");
                return Err(e);
            }
        };
        self.arm();
        Ok(Some(outcome))
    }

    /// Run a cycle immediately without touching the pending timer.
    pub fn plot_now(&mut self, cycle: &mut impl Cycle) -> Result<CycleOutcome, PolysurfError> {
        if self.state == SchedulerState::Terminated {
            return Err(PolysurfError::SchedulerTerminated);
        }
        run_guarded(cycle)
    }

    /// Cancel any pending timer and release render resources. Terminal.
    pub fn shutdown(&mut self, cycle: &mut impl Cycle) -> Result<(), PolysurfError> {
        if self.state == SchedulerState::Terminated {
            return Err(PolysurfError::SchedulerTerminated);
        }
        self.disarm();
        self.state = SchedulerState::Terminated;
        log::info!("Scheduler shut down");
        cycle.release()
    }

    fn arm(&mut self) {
        debug_assert!(self.pending.is_none(), "timer already armed");
        let timer = self.timers.schedule_once(self.interval);
        log::debug!("Armed timer {}", timer.id());
        self.pending = Some(timer);
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.pending.take() {
            let cancelled = self.timers.cancel(timer);
            log::debug!("Cancelled timer {} (was pending: {cancelled})", timer.id());
        }
    }
}

fn run_guarded(cycle: &mut impl Cycle) -> Result<CycleOutcome, PolysurfError> {
    match cycle.run_cycle() {
        Ok(figure) => Ok(CycleOutcome::Rendered(figure)),
        Err(e) if e.is_recoverable() => {
            log::warn!("Skipping cycle: {e}");
            Ok(CycleOutcome::Skipped(e.to_string()))
        }
        Err(e) => Err(e),
    }
}
