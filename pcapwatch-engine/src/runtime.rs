/*!
# Controller runtime

Wires the counters, the ingestion pipeline, the TCP receiver and the window
aggregator together. Frontends only need [`run_controller`] for live mode and
[`replay_file`] to push a capture file through the same pipeline offline.
*/

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use opentelemetry::KeyValue;
use tokio::sync::watch;
use tracing::{info, instrument, Instrument};

use pcapwatch_config::PcapwatchConfig;
use pcapwatch_core::{
    IntervalTicker, ReportSink, Ticker, TracingReportSink, WindowAggregator, WindowReport,
};
use pcapwatch_detection::AggregationState;
use pcapwatch_telemetry::{EventLogger, MetricsRecorder};

use crate::error::EngineError;
use crate::pipeline::{ChunkOutcome, FramePipeline};
use crate::receiver::StreamReceiver;

/// Loads the configuration from `path`, or from the default locations.
pub fn load_config(path: Option<&Path>) -> Result<PcapwatchConfig, EngineError> {
    let config = match path {
        Some(path) => PcapwatchConfig::load_from_path(path)?,
        None => PcapwatchConfig::load()?,
    };
    Ok(config)
}

/// A bound controller, ready to run.
pub struct Controller {
    receiver: StreamReceiver,
    pipeline: Arc<FramePipeline>,
    aggregator: Arc<WindowAggregator>,
    interval: Duration,
}

impl Controller {
    /// Binds the listener and builds the pipeline around the port actually
    /// bound, so self traffic is recognised even for an ephemeral port.
    pub async fn bind(
        config: &PcapwatchConfig,
        sink: Arc<dyn ReportSink>,
        metrics: MetricsRecorder,
    ) -> Result<Self, EngineError> {
        let receiver =
            StreamReceiver::bind(&config.ingest.bind_address(), config.ingest.read_buffer_size)
                .await?;
        let controller_port = receiver.local_addr()?.port();

        let state = Arc::new(AggregationState::new());
        let pipeline = Arc::new(
            FramePipeline::new(state.clone(), controller_port).with_metrics(metrics.clone()),
        );
        let aggregator = Arc::new(WindowAggregator::new(state, sink).with_metrics(metrics));

        Ok(Self {
            receiver,
            pipeline,
            aggregator,
            interval: config.window.interval(),
        })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, EngineError> {
        self.receiver.local_addr()
    }

    pub fn aggregator(&self) -> &Arc<WindowAggregator> {
        &self.aggregator
    }

    /// Runs with the configured wall-clock window until `shutdown` flips.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), EngineError> {
        let ticker = IntervalTicker::new(self.interval);
        self.run_with_ticker(ticker, shutdown).await
    }

    pub async fn run_with_ticker<T>(
        self,
        ticker: T,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), EngineError>
    where
        T: Ticker + 'static,
    {
        let aggregator = self.aggregator.clone();
        let aggregator_shutdown = shutdown.clone();
        let aggregator_handle = tokio::spawn(
            async move { aggregator.run(ticker, aggregator_shutdown).await }
                .instrument(tracing::info_span!("aggregator_task")),
        );

        let received = self.receiver.run(self.pipeline, shutdown).await;
        if received.is_err() {
            aggregator_handle.abort();
            return received;
        }
        aggregator_handle.await?;
        Ok(())
    }
}

/// Runs the controller until `shutdown` flips to `true`, logging one report
/// per window.
#[instrument(level = "info", name = "run_controller", skip_all, fields(port = config.ingest.port))]
pub async fn run_controller(
    config: &PcapwatchConfig,
    metrics: MetricsRecorder,
    shutdown: watch::Receiver<bool>,
) -> Result<(), EngineError> {
    let controller = Controller::bind(config, Arc::new(TracingReportSink), metrics).await?;
    let address = controller.local_addr()?;
    info!(%address, interval_ms = config.window.interval_ms, "controller listening");
    EventLogger::log_event(
        "controller_started",
        vec![KeyValue::new("address", address.to_string())],
    )
    .await;

    controller.run(shutdown).await?;

    EventLogger::log_event("controller_stopped", vec![]).await;
    Ok(())
}

/// Result of an offline replay.
#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub chunks: usize,
    pub bytes: usize,
    pub outcome: ChunkOutcome,
    pub report: Option<WindowReport>,
}

/// Feeds a capture file through the pipeline in `chunk_size` pieces (`0`
/// means the whole file at once) and drains one report covering all of it.
///
/// Only the first chunk can carry the global header; later chunks are read
/// little-endian.
#[instrument(
    level = "info",
    name = "replay_file",
    skip_all,
    fields(path = %path.as_ref().display(), chunk_size = chunk_size)
)]
pub async fn replay_file<P: AsRef<Path>>(
    path: P,
    chunk_size: usize,
    controller_port: u16,
    sink: Arc<dyn ReportSink>,
    metrics: MetricsRecorder,
) -> Result<ReplaySummary, EngineError> {
    let data = Bytes::from(tokio::fs::read(path.as_ref()).await?);
    let step = if chunk_size == 0 {
        data.len().max(1)
    } else {
        chunk_size
    };

    let state = Arc::new(AggregationState::new());
    let pipeline =
        FramePipeline::new(state.clone(), controller_port).with_metrics(metrics.clone());

    let mut outcome = ChunkOutcome::default();
    let mut chunks = 0;
    for offset in (0..data.len()).step_by(step) {
        let end = (offset + step).min(data.len());
        outcome += pipeline.process_chunk(&data.slice(offset..end));
        chunks += 1;
    }

    let report = WindowAggregator::new(state, sink)
        .with_metrics(metrics)
        .tick();

    EventLogger::log_event(
        "replay_complete",
        vec![
            KeyValue::new("chunks", chunks as i64),
            KeyValue::new("frames", outcome.frames as i64),
        ],
    )
    .await;

    Ok(ReplaySummary {
        chunks,
        bytes: data.len(),
        outcome,
        report,
    })
}
