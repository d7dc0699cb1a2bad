//! Timers that drive the polling loop
//!
//! The tracker owns at most one `Ticker` at a time and drops it as soon as
//! no job is active. `IntervalTickSource` is the runtime timer;
//! `ManualTickSource` fires only when told to, for event loops that want to
//! schedule polls themselves and for deterministic tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// A running periodic timer
#[async_trait]
pub trait Ticker: Send {
    /// Wait until the next tick is due.
    async fn tick(&mut self);
}

/// Factory for tickers
pub trait TickSource: Send + Sync {
    fn start(&self, period: Duration) -> Box<dyn Ticker>;
}

/// Tokio interval timer; the first tick fires one period after start.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTickSource;

struct IntervalTicker {
    interval: Interval,
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

impl TickSource for IntervalTickSource {
    fn start(&self, period: Duration) -> Box<dyn Ticker> {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Box::new(IntervalTicker { interval })
    }
}

#[derive(Debug, Default)]
struct ManualState {
    current: Option<mpsc::UnboundedSender<()>>,
    starts: usize,
    period: Option<Duration>,
}

/// Tick source that only fires on `fire()`
#[derive(Debug, Clone, Default)]
pub struct ManualTickSource {
    state: Arc<Mutex<ManualState>>,
}

struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            // Replaced by a newer ticker; never fires again.
            std::future::pending::<()>().await;
        }
    }
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue one tick for the running ticker. Returns false if none is running.
    pub fn fire(&self) -> bool {
        match &self.lock().current {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Whether a ticker is alive (started and not yet dropped)
    pub fn is_running(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// How many tickers have been started so far
    pub fn starts(&self) -> usize {
        self.lock().starts
    }

    /// Period requested by the most recent start
    pub fn period(&self) -> Option<Duration> {
        self.lock().period
    }
}

impl TickSource for ManualTickSource {
    fn start(&self, period: Duration) -> Box<dyn Ticker> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        state.current = Some(tx);
        state.starts += 1;
        state.period = Some(period);
        Box::new(ManualTicker { rx })
    }
}
