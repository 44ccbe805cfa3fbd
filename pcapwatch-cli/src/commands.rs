use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};
use validator::Validate;

use pcapwatch_config::PcapwatchConfig;
use pcapwatch_core::TracingReportSink;
use pcapwatch_engine::{load_config, replay_file, run_controller, ReplaySummary};
use pcapwatch_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser, Debug)]
#[command(name = "pcapwatch", version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/pcapwatch.yaml plus PCAPWATCH_* variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen for probe capture streams and report once per window
    Run(RunArgs),
    /// Feed a capture file through the pipeline and print a single report
    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Listen address, overrides ingest.host
    #[arg(long)]
    pub host: Option<String>,
    /// Listen port, overrides ingest.port
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// PCAP file to replay
    pub file: PathBuf,
    /// Bytes per chunk; 0 hands the whole file over at once
    #[arg(long, default_value_t = 0)]
    pub chunk_size: usize,
}

pub async fn run_command(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref()).context("loading configuration")?;
    EventLogger::init(&config.telemetry.log_level, config.telemetry.json);
    let metrics = MetricsRecorder::new()?;

    match cli.command {
        Commands::Run(args) => run(config, args, metrics).await,
        Commands::Replay(args) => replay(config, args, metrics).await,
    }
}

fn apply_overrides(config: &mut PcapwatchConfig, args: &RunArgs) -> Result<()> {
    if let Some(host) = &args.host {
        config.ingest.host = host.clone();
    }
    if let Some(port) = args.port {
        config.ingest.port = port;
    }
    config
        .validate()
        .context("invalid command-line override")?;
    Ok(())
}

async fn run(mut config: PcapwatchConfig, args: RunArgs, metrics: MetricsRecorder) -> Result<()> {
    apply_overrides(&mut config, &args)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown requested"),
            Err(e) => error!(error = %e, "cannot listen for ctrl-c, stopping"),
        }
        let _ = shutdown_tx.send(true);
    });

    run_controller(&config, metrics.clone(), shutdown_rx).await?;

    if config.telemetry.metrics_on_shutdown {
        println!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

async fn replay(config: PcapwatchConfig, args: ReplayArgs, metrics: MetricsRecorder) -> Result<()> {
    let summary = replay_file(
        &args.file,
        args.chunk_size,
        config.ingest.port,
        Arc::new(TracingReportSink),
        metrics.clone(),
    )
    .await
    .with_context(|| format!("replaying {}", args.file.display()))?;

    print!("{}", render_summary(&summary));
    if config.telemetry.metrics_on_shutdown {
        println!("{}", metrics.gather_metrics()?);
    }
    Ok(())
}

fn render_summary(summary: &ReplaySummary) -> String {
    let mut out = format!(
        "chunks={} bytes={} frames={} undecodable={} suppressed={} resync_bytes={}\n",
        summary.chunks,
        summary.bytes,
        summary.outcome.frames,
        summary.outcome.undecodable,
        summary.outcome.suppressed,
        summary.outcome.skipped_bytes,
    );
    if let Some(report) = &summary.report {
        out.push_str(&format!(
            "syn_rate={} icmp_rate={} ssh_rate={}\n",
            report.syn_rate, report.icmp_rate, report.ssh_rate
        ));
        for entry in &report.port_variety {
            out.push_str(&format!("{} unique_ports={}\n", entry.source, entry.unique_ports));
        }
    }
    out
}
