use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::countdown::{CountdownToken, Scheduler, TimerHandle};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    /// Countdown tick from the timer started with this token
    Tick(CountdownToken),
    /// Nothing arrived within one frame interval
    Refresh,
}

/// Source of events for the main loop (keyboard, resize, countdown ticks)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;

    /// Sender that feeds this source; timers post their ticks through it
    fn sender(&self) -> Sender<GameEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => GameEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("terminal event read failed: {e}");
                    break;
                }
            };
            if key_tx.send(evt).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

/// Channel-backed event source for tests and headless drivers
pub struct TestEventSource {
    tx: Sender<GameEvent>,
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<GameEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to one frame interval and returns the next event, or Refresh on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                GameEvent::Refresh
            }
        }
    }

    /// Scheduler whose ticks arrive through this runner
    pub fn scheduler(&self) -> ThreadScheduler {
        ThreadScheduler::new(self.event_source.sender())
    }
}

/// Scheduler backed by one sleeping thread per countdown. The thread only
/// posts `Tick(token)`; all state changes stay on the event loop.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    tx: Sender<GameEvent>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<GameEvent>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&mut self, interval: Duration, token: CountdownToken) -> TimerHandle {
        let handle = TimerHandle::new(token);
        let cancelled = handle.cancel_flag();
        let tx = self.tx.clone();

        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            if tx.send(GameEvent::Tick(token)).is_err() {
                break;
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::{Countdown, ManualScheduler};

    #[test]
    fn step_returns_refresh_on_timeout() {
        let es = TestEventSource::new();
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Refresh => {}
            other => panic!("expected Refresh on timeout, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let es = TestEventSource::new();
        es.sender().send(GameEvent::Resize).unwrap();
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Resize => {}
            other => panic!("expected Resize event, got {other:?}"),
        }
    }

    #[test]
    fn thread_scheduler_delivers_ticks_for_its_token() {
        let runner = Runner::new(
            TestEventSource::new(),
            FixedTicker::new(Duration::from_millis(500)),
        );
        let mut countdown = Countdown::new();
        let mut sched = runner.scheduler();
        let token = countdown.start(Duration::from_millis(5), &mut sched);

        match runner.step() {
            GameEvent::Tick(t) => assert_eq!(t, token),
            other => panic!("expected Tick, got {other:?}"),
        }
        countdown.cancel();
    }

    #[test]
    fn cancelled_thread_timer_goes_quiet() {
        let es = TestEventSource::new();
        let token = Countdown::new().start(Duration::ZERO, &mut ManualScheduler::new());
        let mut sched = ThreadScheduler::new(es.sender());
        let handle = sched.schedule(Duration::from_millis(20), token);
        handle.cancel();

        // the timer wakes once, sees the flag and exits without sending
        assert!(es.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
