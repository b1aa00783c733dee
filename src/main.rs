//! beaconpipe daemon.
//!
//! Compiles the beacon-only filter policy, then bridges a frame source
//! onto a live pcap stream until the source fails or Ctrl+C.
//!
//! Without real radio hardware attached the frame source is a replay:
//! either a recorded frame file or a run of synthetic beacons. Replayed
//! frames pass through the software filter engine, taking the place of
//! the radio's hardware filtering.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use beaconpipe::config::{Config, SinkSpec};
use beaconpipe::error::CaptureError;
use beaconpipe::filter::{install_beacon_policy, FilterEngine, FilteredSource, SoftwareFilterEngine};
use beaconpipe::sink::{ByteSink, TcpSink};
use beaconpipe::{CaptureBridge, ReplaySource};

#[derive(Parser)]
#[command(name = "beaconpipe")]
#[command(about = "Streams 802.11 beacon frames to a pcap analyzer, live")]
struct Args {
    /// Radio channel to capture on (1-13)
    #[arg(short, long)]
    channel: Option<u8>,

    /// TCP address to serve the capture stream on
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Serve the capture stream through a named pipe at this path
    #[cfg(unix)]
    #[arg(short, long)]
    pipe: Option<PathBuf>,

    /// Replay a recorded frame file instead of generating beacons
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Number of synthetic beacons to generate when not replaying
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Milliseconds between frames (0 = no pacing)
    #[arg(long, default_value_t = 102)]
    interval_ms: u64,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = Config::load().context("invalid configuration")?;
    if let Some(channel) = args.channel {
        config = config.with_channel(channel)?;
    }
    if let Some(listen) = args.listen {
        config = config.with_sink(SinkSpec::Tcp(listen));
    }
    #[cfg(unix)]
    if let Some(pipe) = args.pipe {
        config = config.with_sink(SinkSpec::Fifo(pipe));
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        tracing::info!("stopping after the in-flight frame");
        flag.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    // The filters must be committed before the bridge starts receiving,
    // else unfiltered traffic would reach it.
    let mut engine = SoftwareFilterEngine::new();
    install_beacon_policy(&mut engine).context("failed to install beacon rx filter")?;
    tracing::info!("rx filter slots enabled: {}", engine.enabled_mask()?);

    let source = match &args.replay {
        Some(path) => ReplaySource::from_file(path)
            .with_context(|| format!("failed to load replay file {:?}", path))?,
        None => ReplaySource::synthetic_beacons(args.frames, config.channel),
    };
    let source = if args.interval_ms > 0 {
        source.with_interval(Duration::from_millis(args.interval_ms))
    } else {
        source
    };
    let source = FilteredSource::new(source, engine);

    let sink: Box<dyn ByteSink> = match &config.sink {
        SinkSpec::Tcp(addr) => {
            let sink = TcpSink::open(*addr).context("failed to open TCP sink")?;
            tracing::info!("waiting for analyzer on {}", addr);
            Box::new(sink)
        }
        #[cfg(unix)]
        SinkSpec::Fifo(path) => {
            let sink =
                beaconpipe::sink::FifoSink::open(path.clone()).context("failed to create pipe")?;
            tracing::info!("waiting for analyzer on pipe {:?}", path);
            Box::new(sink)
        }
        #[cfg(not(unix))]
        SinkSpec::Fifo(_) => anyhow::bail!("named-pipe sink is only available on unix"),
    };

    tracing::info!("capturing on channel {}", config.channel);
    match CaptureBridge::new(source, sink)
        .with_stop_flag(running)
        .run()
    {
        Ok(frames) => {
            tracing::info!("stopped, {} frames streamed", frames);
            Ok(())
        }
        // Replay sources end by exhausting their frames, which takes
        // the same path as a hardware receive error.
        Err(CaptureError::Receive(-1)) => {
            tracing::info!("frame source exhausted, stream closed");
            Ok(())
        }
        Err(e) => Err(e).context("capture stream failed"),
    }
}
