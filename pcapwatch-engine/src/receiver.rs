//! ## pcapwatch-engine::receiver
//! **TCP ingress for probe capture streams**
//!
//! Each accepted connection gets its own task. Whatever a single socket read
//! returns is handed to the pipeline as one chunk; records split across two
//! reads are lost.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use opentelemetry::KeyValue;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use pcapwatch_protocols::FrameParser;
use pcapwatch_telemetry::EventLogger;

use crate::error::EngineError;
use crate::pipeline::{ChunkOutcome, FramePipeline};

pub struct StreamReceiver {
    listener: TcpListener,
    read_buffer_size: usize,
}

impl StreamReceiver {
    pub async fn bind(address: &str, read_buffer_size: usize) -> Result<Self, EngineError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| EngineError::Bind {
                address: address.to_owned(),
                source,
            })?;
        Ok(Self {
            listener,
            read_buffer_size: read_buffer_size.max(1),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, EngineError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts probes until `shutdown` flips, then waits for every open
    /// connection to finish its current chunk.
    #[instrument(level = "info", name = "stream_receiver", skip_all)]
    pub async fn run<P>(
        self,
        pipeline: Arc<FramePipeline<P>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), EngineError>
    where
        P: FrameParser + 'static,
    {
        info!(address = ?self.listener.local_addr().ok(), "accepting probe streams");
        let mut connections = JoinSet::new();

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
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        warn!(error = %e, "connection task failed");
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            pipeline.clone(),
                            self.read_buffer_size,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }

        debug!(open = connections.len(), "draining connections");
        while let Some(finished) = connections.join_next().await {
            finished?;
        }
        info!("receiver stopped");
        Ok(())
    }
}

async fn serve_connection<P: FrameParser>(
    mut stream: TcpStream,
    peer: SocketAddr,
    pipeline: Arc<FramePipeline<P>>,
    read_buffer_size: usize,
    mut shutdown: watch::Receiver<bool>,
) {
    EventLogger::log_event(
        "probe_connected",
        vec![KeyValue::new("peer", peer.to_string())],
    )
    .await;

    let mut buffer = BytesMut::with_capacity(read_buffer_size);
    let mut total = ChunkOutcome::default();
    let mut chunks = 0u64;

    loop {
        let stopped = *shutdown.borrow();
        if stopped {
            break;
        }

        buffer.resize(read_buffer_size, 0);
        let read = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            read = stream.read(&mut buffer[..]) => read,
        };

        match read {
            Ok(0) => break,
            Ok(n) => {
                buffer.truncate(n);
                let chunk = buffer.split().freeze();
                total += pipeline.process_chunk(&chunk);
                chunks += 1;
            }
            Err(e) => {
                warn!(peer = %peer, error = %e, "probe stream failed");
                break;
            }
        }
    }

    EventLogger::log_event(
        "probe_disconnected",
        vec![
            KeyValue::new("peer", peer.to_string()),
            KeyValue::new("chunks", chunks as i64),
            KeyValue::new("frames", total.frames as i64),
            KeyValue::new("undecodable", total.undecodable as i64),
        ],
    )
    .await;
}
