//! ## pcapwatch-detection::features
//! **Signal extraction from decoded frames**
//!
//! Signals tracked per window:
//! - SYN without ACK (flood)
//! - ICMP Echo-Request (sweep)
//! - distinct destination ports per source (scan fan-out)
//! - PSH towards port 22 (SSH brute force)
//!
//! TCP traffic addressed to the controller's own listening port is dropped
//! before anything is counted, otherwise the probe would report the stream it
//! sends us.

use std::sync::Arc;

use pcapwatch_protocols::FrameView;
use tracing::trace;

use crate::counters::AggregationState;

pub const SSH_PORT: u16 = 22;

/// What happened to a frame handed to [`FeatureExtractor::extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Self traffic; no counter touched.
    Suppressed,
    Counted,
}

pub struct FeatureExtractor {
    state: Arc<AggregationState>,
    controller_port: u16,
}

impl FeatureExtractor {
    pub fn new(state: Arc<AggregationState>, controller_port: u16) -> Self {
        Self {
            state,
            controller_port,
        }
    }

    pub fn controller_port(&self) -> u16 {
        self.controller_port
    }

    pub fn state(&self) -> &Arc<AggregationState> {
        &self.state
    }

    /// Updates the counters from one frame.
    pub fn extract<F: FrameView + ?Sized>(&self, frame: &F) -> Extraction {
        let tcp = frame.tcp();

        if let Some(tcp) = tcp {
            if tcp.destination_port == self.controller_port {
                trace!(port = tcp.destination_port, "dropping controller-bound frame");
                return Extraction::Suppressed;
            }
        }

        self.state.bytes_add(frame.frame_len() as u64);

        if let Some(tcp) = tcp {
            if tcp.flags.is_connection_request() {
                self.state.syn_record();
            }
            if let Some(ip) = frame.ip() {
                self.state.port_observe(ip.source, tcp.destination_port);
            }
            if tcp.destination_port == SSH_PORT && tcp.flags.psh {
                self.state.ssh_psh_record();
            }
        }

        if let Some(icmp) = frame.icmp() {
            if icmp.is_echo_request() {
                self.state.icmp_echo_record();
            }
        }

        Extraction::Counted
    }
}
