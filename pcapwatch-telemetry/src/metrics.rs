//! ## pcapwatch-telemetry::metrics
//! **Prometheus registry for the ingestion pipeline**

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub chunks_received: IntCounter,
    pub bytes_received: IntCounter,
    pub frames_extracted: IntCounter,
    pub frames_undecodable: IntCounter,
    pub frames_suppressed: IntCounter,
    pub resync_bytes: IntCounter,
    pub reports_emitted: IntCounter,
    pub reports_skipped: IntCounter,
    /// Bytes counted during the last completed window.
    pub window_bytes: IntGauge,
    pub chunk_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| -> Result<IntCounter, prometheus::Error> {
            let counter = IntCounter::new(name, help)?;
            registry.register(Box::new(counter.clone()))?;
            Ok(counter)
        };

        let chunks_received = counter("pcapwatch_chunks_total", "Chunks read from probes")?;
        let bytes_received = counter("pcapwatch_received_bytes_total", "Bytes read from probes")?;
        let frames_extracted =
            counter("pcapwatch_frames_total", "Frames recovered from chunks")?;
        let frames_undecodable = counter(
            "pcapwatch_frames_undecodable_total",
            "Frames rejected by the header decoder",
        )?;
        let frames_suppressed = counter(
            "pcapwatch_frames_suppressed_total",
            "Frames addressed to the controller itself",
        )?;
        let resync_bytes = counter(
            "pcapwatch_resync_bytes_total",
            "Bytes skipped while resynchronising framing",
        )?;
        let reports_emitted = counter("pcapwatch_reports_total", "Window reports emitted")?;
        let reports_skipped = counter(
            "pcapwatch_reports_skipped_total",
            "Ticks dropped because a report was in progress",
        )?;

        let window_bytes = IntGauge::new(
            "pcapwatch_window_bytes",
            "Bytes observed during the last window",
        )?;
        registry.register(Box::new(window_bytes.clone()))?;

        let chunk_latency = Histogram::with_opts(
            HistogramOpts::new(
                "pcapwatch_chunk_latency_ns",
                "Time to frame, decode and count one chunk",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0]),
        )?;
        registry.register(Box::new(chunk_latency.clone()))?;

        Ok(Self {
            registry,
            chunks_received,
            bytes_received,
            frames_extracted,
            frames_undecodable,
            frames_suppressed,
            resync_bytes,
            reports_emitted,
            reports_skipped,
            window_bytes,
            chunk_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_exports() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.frames_extracted.inc_by(3);
        metrics.window_bytes.set(162);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("pcapwatch_frames_total 3"));
        assert!(text.contains("pcapwatch_window_bytes 162"));
    }

    #[test]
    fn recorders_are_independent() {
        let a = MetricsRecorder::new().unwrap();
        let b = MetricsRecorder::new().unwrap();
        a.chunks_received.inc();
        assert_eq!(b.chunks_received.get(), 0);
    }
}
