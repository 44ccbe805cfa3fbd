//! Window reports and the sinks that receive them.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pcapwatch_detection::CounterSnapshot;
use serde::Serialize;
use tracing::info;

/// Distinct destination ports one source touched during a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortVariety {
    pub source: IpAddr,
    pub unique_ports: usize,
}

/// Counts accumulated over one window. At the default one-second window the
/// counts are per-second rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowReport {
    pub window_end: DateTime<Utc>,
    pub syn_rate: u64,
    pub icmp_rate: u64,
    pub ssh_rate: u64,
    /// Sorted by source for stable output; consumers should not rely on it.
    pub port_variety: Vec<PortVariety>,
}

impl WindowReport {
    pub fn from_snapshot(snapshot: &CounterSnapshot, window_end: DateTime<Utc>) -> Self {
        let mut port_variety: Vec<PortVariety> = snapshot
            .port_variety
            .iter()
            .map(|(source, unique_ports)| PortVariety {
                source: *source,
                unique_ports: *unique_ports,
            })
            .collect();
        port_variety.sort_by_key(|entry| entry.source);

        Self {
            window_end,
            syn_rate: snapshot.syn,
            icmp_rate: snapshot.icmp_echo,
            ssh_rate: snapshot.ssh_psh,
            port_variety,
        }
    }

    /// No signal of any kind in this window.
    pub fn is_empty(&self) -> bool {
        self.syn_rate == 0 && self.icmp_rate == 0 && self.ssh_rate == 0 && self.port_variety.is_empty()
    }

    pub fn unique_ports_for(&self, source: IpAddr) -> Option<usize> {
        self.port_variety
            .iter()
            .find(|entry| entry.source == source)
            .map(|entry| entry.unique_ports)
    }
}

/// Destination of window reports.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &WindowReport);
}

/// Writes each report as structured log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportSink;

impl ReportSink for TracingReportSink {
    fn emit(&self, report: &WindowReport) {
        info!(
            window_end = %report.window_end,
            syn_rate = report.syn_rate,
            icmp_rate = report.icmp_rate,
            ssh_rate = report.ssh_rate,
            sources = report.port_variety.len(),
            "window report"
        );
        for entry in &report.port_variety {
            info!(
                source = %entry.source,
                unique_ports = entry.unique_ports,
                "scanner alert"
            );
        }
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<WindowReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<WindowReport> {
        self.reports.lock().clone()
    }

    pub fn last(&self) -> Option<WindowReport> {
        self.reports.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, report: &WindowReport) {
        self.reports.lock().push(report.clone());
    }
}
