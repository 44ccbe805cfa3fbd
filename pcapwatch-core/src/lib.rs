//! # pcapwatch-core
//!
//! Windowed aggregation of the detection counters.
//!
//! ### Key Submodules:
//! - `report`: the per-window report and the sinks it is delivered to
//! - `time`: tickers driving the window cadence
//! - `window`: the aggregator draining counters once per tick

pub mod report;
pub mod time;
pub mod window;

pub mod prelude {
    pub use crate::report::*;
    pub use crate::time::*;
    pub use crate::window::*;
}

pub use report::{MemorySink, PortVariety, ReportSink, TracingReportSink, WindowReport};
pub use time::{IntervalTicker, ManualTickHandle, ManualTicker, Ticker};
pub use window::{AggregatorPhase, WindowAggregator};
