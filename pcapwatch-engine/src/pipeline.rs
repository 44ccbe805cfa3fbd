//! ## pcapwatch-engine::pipeline
//! **Chunk → frames → headers → counters**
//!
//! Everything here is synchronous. A chunk is framed on its own, its frames
//! are decoded left to right and each decoded frame updates the shared
//! counters before the next one is looked at.

use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::trace;

use pcapwatch_capture::FrameExtractor;
use pcapwatch_detection::{AggregationState, Extraction, FeatureExtractor};
use pcapwatch_protocols::{EthernetParser, FrameParser};
use pcapwatch_telemetry::MetricsRecorder;

/// What one chunk produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub frames: usize,
    pub undecodable: usize,
    pub suppressed: usize,
    pub skipped_bytes: usize,
}

impl AddAssign for ChunkOutcome {
    fn add_assign(&mut self, other: Self) {
        self.frames += other.frames;
        self.undecodable += other.undecodable;
        self.suppressed += other.suppressed;
        self.skipped_bytes += other.skipped_bytes;
    }
}

pub struct FramePipeline<P: FrameParser = EthernetParser> {
    extractor: FrameExtractor,
    parser: P,
    features: FeatureExtractor,
    metrics: Option<MetricsRecorder>,
}

impl FramePipeline<EthernetParser> {
    pub fn new(state: Arc<AggregationState>, controller_port: u16) -> Self {
        Self::with_parser(EthernetParser::new(), state, controller_port)
    }
}

impl<P: FrameParser> FramePipeline<P> {
    pub fn with_parser(parser: P, state: Arc<AggregationState>, controller_port: u16) -> Self {
        Self {
            extractor: FrameExtractor::new(),
            parser,
            features: FeatureExtractor::new(state, controller_port),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn controller_port(&self) -> u16 {
        self.features.controller_port()
    }

    pub fn process_chunk(&self, chunk: &Bytes) -> ChunkOutcome {
        let start = Instant::now();
        let mut outcome = ChunkOutcome::default();

        let mut frames = self.extractor.extract(chunk);
        for frame in frames.by_ref() {
            outcome.frames += 1;
            match self.parser.parse(&frame.data) {
                Ok(decoded) => {
                    if self.features.extract(&decoded) == Extraction::Suppressed {
                        outcome.suppressed += 1;
                    }
                }
                Err(e) => {
                    outcome.undecodable += 1;
                    trace!(error = %e, len = frame.len(), "dropping undecodable frame");
                }
            }
        }
        outcome.skipped_bytes = frames.skipped_bytes();

        if let Some(metrics) = &self.metrics {
            metrics.chunks_received.inc();
            metrics.bytes_received.inc_by(chunk.len() as u64);
            metrics.frames_extracted.inc_by(outcome.frames as u64);
            metrics.frames_undecodable.inc_by(outcome.undecodable as u64);
            metrics.frames_suppressed.inc_by(outcome.suppressed as u64);
            metrics.resync_bytes.inc_by(outcome.skipped_bytes as u64);
            metrics
                .chunk_latency
                .observe(start.elapsed().as_nanos() as f64);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcapwatch_capture::synth::{self, PcapStreamBuilder};
    use pcapwatch_capture::ByteOrder;
    use std::net::Ipv4Addr;

    const PROBE: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 9);
    const CONTROLLER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

    fn pipeline() -> (Arc<AggregationState>, FramePipeline) {
        let state = Arc::new(AggregationState::new());
        (state.clone(), FramePipeline::new(state, 9000))
    }

    #[test]
    fn counts_every_outcome() {
        let (state, pipeline) = pipeline();
        let metrics = MetricsRecorder::new().unwrap();
        let pipeline = pipeline.with_metrics(metrics.clone());

        let syn = synth::ipv4_tcp_frame(PROBE, CONTROLLER, 50000, 80, synth::TCP_SYN);
        let chunk = PcapStreamBuilder::with_global_header(ByteOrder::Little)
            .record(&syn)
            .record(&synth::ipv4_tcp_frame(PROBE, CONTROLLER, 50000, 9000, synth::TCP_PSH))
            .record(&syn[..30])
            .build();

        let outcome = pipeline.process_chunk(&chunk);
        assert_eq!(
            outcome,
            ChunkOutcome {
                frames: 3,
                undecodable: 1,
                suppressed: 1,
                skipped_bytes: 0,
            }
        );

        let snapshot = state.drain();
        assert_eq!(snapshot.syn, 1);
        assert_eq!(snapshot.total_bytes, 54);

        assert_eq!(metrics.chunks_received.get(), 1);
        assert_eq!(metrics.bytes_received.get(), chunk.len() as u64);
        assert_eq!(metrics.frames_extracted.get(), 3);
        assert_eq!(metrics.frames_undecodable.get(), 1);
        assert_eq!(metrics.frames_suppressed.get(), 1);
        assert_eq!(metrics.chunk_latency.get_sample_count(), 1);
    }

    #[test]
    fn runt_record_is_skipped_and_next_record_recovered() {
        let (state, pipeline) = pipeline();
        let echo = synth::ipv4_icmp_frame(PROBE, CONTROLLER, 8);
        let chunk = PcapStreamBuilder::with_global_header(ByteOrder::Little)
            .record(&[0u8; 10])
            .record(&echo)
            .build();

        let outcome = pipeline.process_chunk(&chunk);
        assert_eq!(outcome.frames, 1);
        assert_eq!(outcome.undecodable, 0);
        assert_eq!(outcome.skipped_bytes, 16 + 10);

        let snapshot = state.drain();
        assert_eq!(snapshot.icmp_echo, 1);
        assert_eq!(snapshot.total_bytes, echo.len() as u64);
    }

    #[test]
    fn short_chunk_does_nothing() {
        let (state, pipeline) = pipeline();
        let outcome = pipeline.process_chunk(&Bytes::from_static(&[0xD4, 0xC3, 0xB2]));
        assert_eq!(outcome, ChunkOutcome::default());
        assert!(state.drain().is_quiet());
    }

    #[test]
    fn outcomes_accumulate() {
        let mut total = ChunkOutcome::default();
        total += ChunkOutcome {
            frames: 2,
            undecodable: 1,
            suppressed: 0,
            skipped_bytes: 3,
        };
        total += ChunkOutcome {
            frames: 1,
            undecodable: 0,
            suppressed: 1,
            skipped_bytes: 0,
        };
        assert_eq!(total.frames, 3);
        assert_eq!(total.suppressed, 1);
        assert_eq!(total.skipped_bytes, 3);
    }
}
