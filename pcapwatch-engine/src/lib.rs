//! # pcapwatch-engine
//!
//! Runtime wiring for the controller: probe streams come in over TCP, are
//! framed, decoded and counted, and a window aggregator reports the counters
//! on a fixed cadence.

pub mod error;
pub mod pipeline;
pub mod receiver;
pub mod runtime;

pub use error::EngineError;
pub use pipeline::{ChunkOutcome, FramePipeline};
pub use receiver::StreamReceiver;
pub use runtime::{load_config, replay_file, run_controller, Controller, ReplaySummary};
