//! ## pcapwatch-core::time
//! **Tickers driving the reporting window**
//!
//! The aggregator owns a [`Ticker`] and asks it for the next tick in a loop.
//! [`IntervalTicker`] follows wall-clock time and drops ticks it could not
//! deliver on time; [`ManualTicker`] is driven explicitly through a handle.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick. `None` means the ticker has stopped.
    async fn tick(&mut self) -> Option<Instant>;
}

/// Fixed-period wall-clock ticker. The first tick fires one period after
/// creation; missed ticks are skipped rather than bunched up.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> Option<Instant> {
        Some(self.interval.tick().await)
    }
}

/// Ticker fired by hand through a [`ManualTickHandle`]. Stops once every
/// handle is dropped.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

#[derive(Clone)]
pub struct ManualTickHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ManualTicker {
    pub fn new() -> (Self, ManualTickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, ManualTickHandle { tx })
    }
}

impl ManualTickHandle {
    /// Queues one tick. Returns `false` if the ticker is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> Option<Instant> {
        self.rx.recv().await.map(|_| Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interval_waits_one_period_first() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_millis(1000));
        let first = ticker.tick().await.unwrap();
        assert_eq!(first - start, Duration::from_millis(1000));
        let second = ticker.tick().await.unwrap();
        assert_eq!(second - first, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn missed_ticks_are_skipped() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_millis(1000));
        // Stall well past three periods.
        tokio::time::advance(Duration::from_millis(3500)).await;
        let late = ticker.tick().await.unwrap();
        let next = ticker.tick().await.unwrap();
        assert!(late - start >= Duration::from_millis(1000));
        assert_eq!(next - start, Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn manual_ticker_stops_with_handles() {
        let (mut ticker, handle) = ManualTicker::new();
        assert!(handle.fire());
        assert!(ticker.tick().await.is_some());
        drop(handle);
        assert!(ticker.tick().await.is_none());
    }
}
