//! ## pcapwatch-detection::counters
//! **Window-scoped attack signal counters**
//!
//! Scalar counters are atomics drained with an exchange to zero. The
//! port-variety map sits behind a mutex and is drained by swapping a fresh map
//! in under the lock; the old map is summarised after the lock is released, so
//! writers only ever contend with the swap itself.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Shared aggregation state written by feature extraction and drained once
/// per window.
#[derive(Debug, Default)]
pub struct AggregationState {
    syn: AtomicU64,
    icmp_echo: AtomicU64,
    ssh_psh: AtomicU64,
    total_bytes: AtomicU64,
    port_variety: Mutex<HashMap<IpAddr, HashSet<u16>>>,
}

/// Values read out of [`AggregationState`] by one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub syn: u64,
    pub icmp_echo: u64,
    pub ssh_psh: u64,
    pub total_bytes: u64,
    /// Source address to number of distinct destination ports.
    pub port_variety: HashMap<IpAddr, usize>,
}

impl CounterSnapshot {
    /// True when nothing was observed during the window.
    pub fn is_quiet(&self) -> bool {
        self.syn == 0
            && self.icmp_echo == 0
            && self.ssh_psh == 0
            && self.total_bytes == 0
            && self.port_variety.is_empty()
    }
}

impl AggregationState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn syn_record(&self) {
        self.syn.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn icmp_echo_record(&self) {
        self.icmp_echo.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn ssh_psh_record(&self) {
        self.ssh_psh.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn bytes_add(&self, len: u64) {
        self.total_bytes.fetch_add(len, Ordering::Relaxed);
    }

    /// Records that `source` contacted `port` in the current window.
    pub fn port_observe(&self, source: IpAddr, port: u16) {
        self.port_variety
            .lock()
            .entry(source)
            .or_default()
            .insert(port);
    }

    /// Reads every counter and resets it.
    pub fn drain(&self) -> CounterSnapshot {
        let syn = self.syn.swap(0, Ordering::AcqRel);
        let icmp_echo = self.icmp_echo.swap(0, Ordering::AcqRel);
        let ssh_psh = self.ssh_psh.swap(0, Ordering::AcqRel);
        let total_bytes = self.total_bytes.swap(0, Ordering::AcqRel);

        let previous = std::mem::take(&mut *self.port_variety.lock());
        let port_variety = previous
            .into_iter()
            .map(|(source, ports)| (source, ports.len()))
            .collect();

        CounterSnapshot {
            syn,
            icmp_echo,
            ssh_psh,
            total_bytes,
            port_variety,
        }
    }
}
