//! ## pcapwatch-telemetry::logging
//! **Structured logging with tracing**
//!
//! `RUST_LOG` takes precedence over the configured default level. Controller
//! lifecycle events carry their metadata as OpenTelemetry key/value pairs
//! inside a `controller_event` span.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. Later calls are no-ops.
    pub fn init(default_level: &str, json: bool) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE);

        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    }

    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "controller_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "controller event"
            );
        }
        .instrument(span)
        .await
    }
}
