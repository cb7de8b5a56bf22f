use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Identifies one started countdown. Ticks carrying any other token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountdownToken(u64);

impl CountdownToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Handle to a periodic timer. Cancelling (or dropping) it stops the ticks.
#[derive(Debug)]
pub struct TimerHandle {
    token: CountdownToken,
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn new(token: CountdownToken) -> Self {
        Self {
            token,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> CountdownToken {
        self.token
    }

    /// Shared flag a timer implementation polls before every tick
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Something that can fire `Tick(token)` every `interval` until cancelled
pub trait Scheduler {
    fn schedule(&mut self, interval: Duration, token: CountdownToken) -> TimerHandle;
}

/// Scheduler that never fires on its own; tests and headless drivers
/// deliver ticks by hand and inspect what was scheduled.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    scheduled: Vec<(Duration, CountdownToken, Arc<AtomicBool>)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every countdown ever scheduled, in order
    pub fn scheduled(&self) -> Vec<(Duration, CountdownToken)> {
        self.scheduled.iter().map(|(i, t, _)| (*i, *t)).collect()
    }

    /// Tokens whose timers have not been cancelled
    pub fn active(&self) -> Vec<CountdownToken> {
        self.scheduled
            .iter()
            .filter(|(_, _, flag)| !flag.load(Ordering::SeqCst))
            .map(|(_, t, _)| *t)
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, interval: Duration, token: CountdownToken) -> TimerHandle {
        let handle = TimerHandle::new(token);
        self.scheduled.push((interval, token, handle.cancel_flag()));
        handle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    Idle,
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token, or the countdown is not running
    Ignored,
    /// Time went down by one and is still above zero
    Decremented(u32),
    /// Time reached zero on this tick; the timer has been cancelled
    Expired,
}

/// Countdown state machine: Idle -> Running -> Expired.
/// At most one timer is live; starting again cancels the previous one first.
#[derive(Debug)]
pub struct Countdown {
    phase: CountdownPhase,
    generation: u64,
    interval: Option<Duration>,
    timer: Option<TimerHandle>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            phase: CountdownPhase::Idle,
            generation: 0,
            interval: None,
            timer: None,
        }
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Token of the live timer, if one is running
    pub fn token(&self) -> Option<CountdownToken> {
        self.timer.as_ref().map(TimerHandle::token)
    }

    pub fn start<S: Scheduler + ?Sized>(
        &mut self,
        interval: Duration,
        scheduler: &mut S,
    ) -> CountdownToken {
        self.cancel();

        self.generation += 1;
        let token = CountdownToken(self.generation);
        self.timer = Some(scheduler.schedule(interval, token));
        self.interval = Some(interval);
        self.phase = CountdownPhase::Running;

        token
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.phase = CountdownPhase::Idle;
    }

    pub fn tick(&mut self, token: CountdownToken, time_remaining: &mut u32) -> TickOutcome {
        if self.phase != CountdownPhase::Running || self.token() != Some(token) {
            return TickOutcome::Ignored;
        }

        *time_remaining = time_remaining.saturating_sub(1);
        if *time_remaining > 0 {
            return TickOutcome::Decremented(*time_remaining);
        }

        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.phase = CountdownPhase::Expired;
        TickOutcome::Expired
    }
}
