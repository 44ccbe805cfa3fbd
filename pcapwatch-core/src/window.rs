//! ## pcapwatch-core::window
//! **Per-window drain of the detection counters**
//!
//! The aggregator is either idle or reporting. A tick that finds it reporting
//! is dropped, so two drains of the same counters never overlap. Ticks missed
//! while stalled are not made up for; each report covers whatever accumulated
//! since the previous one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use pcapwatch_detection::AggregationState;
use pcapwatch_telemetry::MetricsRecorder;

use crate::report::{ReportSink, WindowReport};
use crate::time::Ticker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorPhase {
    Idle,
    Reporting,
}

pub struct WindowAggregator {
    state: Arc<AggregationState>,
    sink: Arc<dyn ReportSink>,
    metrics: Option<MetricsRecorder>,
    reporting: AtomicBool,
}

impl WindowAggregator {
    pub fn new(state: Arc<AggregationState>, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            state,
            sink,
            metrics: None,
            reporting: AtomicBool::new(false),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn phase(&self) -> AggregatorPhase {
        if self.reporting.load(Ordering::Acquire) {
            AggregatorPhase::Reporting
        } else {
            AggregatorPhase::Idle
        }
    }

    /// Drains the counters and emits one report. Returns `None` without
    /// touching the counters if a report is already in progress.
    pub fn tick(&self) -> Option<WindowReport> {
        if self
            .reporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("report in progress, skipping tick");
            if let Some(metrics) = &self.metrics {
                metrics.reports_skipped.inc();
            }
            return None;
        }

        let snapshot = self.state.drain();
        let report = WindowReport::from_snapshot(&snapshot, Utc::now());
        debug!(bytes = snapshot.total_bytes, "window drained");

        self.sink.emit(&report);

        if let Some(metrics) = &self.metrics {
            metrics.reports_emitted.inc();
            metrics
                .window_bytes
                .set(i64::try_from(snapshot.total_bytes).unwrap_or(i64::MAX));
        }

        self.reporting.store(false, Ordering::Release);
        Some(report)
    }

    /// Emits a report on every tick until the ticker stops or `shutdown`
    /// flips to `true`. A tick already being reported finishes first.
    #[instrument(level = "info", name = "window_aggregator", skip_all)]
    pub async fn run<T: Ticker>(&self, mut ticker: T, mut shutdown: watch::Receiver<bool>) {
        info!("aggregator started");
        loop {
            let stopped = *shutdown.borrow();
            if stopped {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                tick = ticker.tick() => {
                    if tick.is_none() {
                        break;
                    }
                    self.tick();
                }
            }
        }
        info!("aggregator stopped");
    }
}
