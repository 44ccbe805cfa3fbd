use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;

use pcapwatch_capture::synth::{self, PcapStreamBuilder};
use pcapwatch_capture::ByteOrder;
use pcapwatch_config::PcapwatchConfig;
use pcapwatch_core::{AggregatorPhase, ManualTicker, MemorySink};
use pcapwatch_engine::Controller;
use pcapwatch_telemetry::MetricsRecorder;

const PROBE: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);
const SCANNER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
const TARGET: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 20);

fn loopback_config() -> PcapwatchConfig {
    let mut config = PcapwatchConfig::default();
    config.ingest.host = "127.0.0.1".into();
    config.ingest.port = 0;
    config
}

async fn send(address: SocketAddr, chunk: &[u8]) {
    let mut probe = TcpStream::connect(address).await.unwrap();
    probe.write_all(chunk).await.unwrap();
    probe.shutdown().await.unwrap();
}

async fn wait_for(what: impl Fn() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !what() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn probe_stream_is_counted_without_self_traffic() {
    let sink = Arc::new(MemorySink::new());
    let metrics = MetricsRecorder::new().unwrap();
    let controller = Controller::bind(&loopback_config(), sink.clone(), metrics.clone())
        .await
        .unwrap();
    let address = controller.local_addr().unwrap();
    assert_eq!(controller.aggregator().phase(), AggregatorPhase::Idle);

    let (ticker, ticks) = ManualTicker::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(controller.run_with_ticker(ticker, shutdown_rx));

    // The probe also captures its own upload to the controller.
    let chunk = PcapStreamBuilder::with_global_header(ByteOrder::Big)
        .record(&synth::ipv4_tcp_frame(SCANNER, TARGET, 40000, 80, synth::TCP_SYN))
        .record(&synth::ipv4_tcp_frame(
            PROBE,
            Ipv4Addr::LOCALHOST,
            51000,
            address.port(),
            synth::TCP_PSH | synth::TCP_ACK,
        ))
        .build();
    send(address, &chunk).await;

    wait_for(|| metrics.frames_extracted.get() == 2).await;
    assert!(ticks.fire());
    wait_for(|| sink.len() == 1).await;

    let report = sink.last().unwrap();
    assert_eq!(report.syn_rate, 1);
    assert_eq!(report.unique_ports_for(IpAddr::V4(SCANNER)), Some(1));
    assert_eq!(report.unique_ports_for(IpAddr::V4(PROBE)), None);
    assert_eq!(metrics.frames_suppressed.get(), 1);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn probes_are_served_concurrently() {
    let sink = Arc::new(MemorySink::new());
    let metrics = MetricsRecorder::new().unwrap();
    let controller = Controller::bind(&loopback_config(), sink.clone(), metrics.clone())
        .await
        .unwrap();
    let address = controller.local_addr().unwrap();

    let (ticker, ticks) = ManualTicker::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(controller.run_with_ticker(ticker, shutdown_rx));

    let probes: Vec<_> = (1..=4u8)
        .map(|last| {
            let chunk = PcapStreamBuilder::with_global_header(ByteOrder::Little)
                .record(&synth::ipv4_tcp_frame(
                    Ipv4Addr::new(10, 0, 1, last),
                    TARGET,
                    40000,
                    443,
                    synth::TCP_SYN,
                ))
                .build();
            tokio::spawn(async move { send(address, &chunk).await })
        })
        .collect();
    for probe in probes {
        probe.await.unwrap();
    }

    wait_for(|| metrics.frames_extracted.get() == 4).await;
    ticks.fire();
    wait_for(|| sink.len() == 1).await;

    let report = sink.last().unwrap();
    assert_eq!(report.syn_rate, 4);
    assert_eq!(report.port_variety.len(), 4);

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_stops_reporting() {
    let sink = Arc::new(MemorySink::new());
    let controller = Controller::bind(&loopback_config(), sink.clone(), MetricsRecorder::new().unwrap())
        .await
        .unwrap();
    let address = controller.local_addr().unwrap();

    let (ticker, ticks) = ManualTicker::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(controller.run_with_ticker(ticker, shutdown_rx));

    shutdown_tx.send(true).unwrap();
    task.await.unwrap().unwrap();

    assert!(!ticks.fire());
    assert!(sink.is_empty());
    assert!(TcpStream::connect(address).await.is_err());
}
