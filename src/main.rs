use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use clocksync::algorithm::{Algorithm, SyncEstimator};
use clocksync::stats::SyncStats;
use clocksync::transport::{calibrate_loopback_latency_us, PacketTransport, UdpTransport};
use clocksync::wire::{Message, NodeMode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Standalone demo of the TinySync/MiniSync clock synchronization algorithms.", long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Start node in reference mode: other peers synchronize to this node's clock.
    Ref {
        /// Local UDP port to bind to.
        bind_port: u16,
    },
    /// Start node in synchronization mode.
    Sync {
        /// Local UDP port to bind to.
        bind_port: u16,
        /// Address of the peer to synchronize with.
        address: String,
        /// Target UDP port on the peer.
        port: u16,
        /// Which pruning strategy to run.
        #[arg(short, long, default_value = "mini-sync")]
        algorithm: Algorithm,
        /// Write per-sample drift/offset statistics to this CSV file on exit.
        #[arg(short, long)]
        output: Option<String>,
        /// Loopback beacons to round-trip before synchronizing, to measure the
        /// one-way delay correction applied to every `T_o`/`T_r`. 0 skips
        /// calibration and leaves both corrections at zero.
        #[arg(long, default_value_t = 20)]
        calibrate_samples: u32,
    },
}

fn run_reference(bind_port: u16, running: Arc<AtomicBool>) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", bind_port)).context("binding reference socket")?;
    socket.set_read_timeout(Some(Duration::from_millis(200)))?;
    info!("listening for beacons on port {bind_port}");

    let mut buf = [0u8; 64];
    while running.load(Ordering::SeqCst) {
        let (n, peer): (usize, SocketAddr) = match socket.recv_from(&mut buf) {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        };
        let recv_time_us = now_micros();

        match Message::from_bytes(&buf[..n]) {
            Ok(Message::Handshake { mode }) => {
                info!("handshake from {peer} (mode={mode:?})");
                let reply = Message::Handshake { mode: NodeMode::Reference };
                if let Err(e) = socket.send_to(&reply.to_bytes(), peer) {
                    warn!("failed to send handshake reply to {peer}: {e}");
                }
            }
            Ok(Message::Beacon { seq, send_time_us }) => {
                let reply_send_time_us = now_micros();
                let reply = Message::BeaconReply {
                    seq,
                    beacon_send_time_us: send_time_us,
                    beacon_recv_time_us: recv_time_us as u64,
                    reply_send_time_us: reply_send_time_us as u64,
                };
                if let Err(e) = socket.send_to(&reply.to_bytes(), peer) {
                    warn!("failed to send beacon reply to {peer}: {e}");
                }
            }
            Ok(Message::Goodbye { .. }) => {
                info!("peer {peer} said goodbye");
            }
            Ok(_other) => {}
            Err(e) => warn!("ignoring malformed packet from {peer}: {e}"),
        }
    }
    Ok(())
}

fn run_sync(
    bind_port: u16,
    peer_addr: String,
    peer_port: u16,
    algorithm: Algorithm,
    output: Option<String>,
    calibrate_samples: u32,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let local: SocketAddr = format!("0.0.0.0:{bind_port}").parse().context("parsing bind address")?;
    let peer: SocketAddr = format!("{peer_addr}:{peer_port}").parse().context("parsing peer address")?;
    let transport = UdpTransport::connect(local, peer, Duration::from_millis(500))?;

    perform_handshake(&transport)?;

    let (min_beacon_delay_us, min_reply_delay_us) = if calibrate_samples > 0 {
        let round_trip_us = calibrate_loopback_latency_us(calibrate_samples)?;
        let one_way_us = round_trip_us / 2.0;
        info!("loopback calibration: round trip {round_trip_us:.1}us, one-way correction {one_way_us:.1}us");
        (one_way_us, one_way_us)
    } else {
        (0.0, 0.0)
    };

    info!("synchronizing with {peer} using {algorithm:?}");

    let mut estimator = SyncEstimator::new(algorithm);
    let mut stats = SyncStats::new();
    let mut seq: u8 = 0;
    let mut last_log = Instant::now();
    let mut buf = [0u8; 64];

    while running.load(Ordering::SeqCst) {
        let send_time_us = now_micros();
        let beacon = Message::Beacon { seq, send_time_us: send_time_us as u64 };
        if let Err(e) = transport.send(&beacon.to_bytes()) {
            warn!("failed to send beacon: {e}");
            std::thread::sleep(Duration::from_secs(1));
            continue;
        }

        match transport.recv(&mut buf) {
            Ok(Some(n)) => {
                let recv_time_us = now_micros();
                if let Ok(Message::BeaconReply { seq: reply_seq, beacon_send_time_us, reply_send_time_us, .. }) =
                    Message::from_bytes(&buf[..n])
                {
                    if reply_seq == seq {
                        let t_o = beacon_send_time_us as f64 + min_beacon_delay_us;
                        let t_b = reply_send_time_us as f64;
                        let t_r = recv_time_us - min_reply_delay_us;
                        match estimator.add_sample(t_o, t_b, t_r) {
                            Ok(()) => {
                                let drift = estimator.drift();
                                let offset = estimator.offset();
                                stats.add_sample(drift.value, drift.error, offset.value, offset.error);
                            }
                            Err(e) => warn!("sample rejected: {e}"),
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!("recv error: {e}"),
        }

        if last_log.elapsed() >= Duration::from_secs(10) {
            info!(
                "drift={:.9} (+/-{:.9}) offset={:.3}us (+/-{:.3}us) samples={}",
                estimator.drift().value,
                estimator.drift().error,
                estimator.offset().value,
                estimator.offset().error,
                estimator.processed()
            );
            last_log = Instant::now();
        }

        seq = seq.wrapping_add(1);
        std::thread::sleep(Duration::from_millis(200));
    }

    let _ = transport.send(&Message::Goodbye { ack: true }.to_bytes());

    if let Some(path) = output {
        let n = stats.write_csv(&path)?;
        info!("wrote {n} samples to {path}");
    }

    Ok(())
}

/// Exchanges a `Handshake` with the peer before beaconing starts, retrying a
/// few times over the transport's own read timeout. Mirrors the reference
/// node's roleless-until-handshake model: neither side estimates or answers
/// beacons meaningfully until it knows who it's talking to.
fn perform_handshake(transport: &UdpTransport) -> Result<()> {
    let hello = Message::Handshake { mode: NodeMode::Sync };
    let mut buf = [0u8; 64];
    for attempt in 1..=5 {
        transport.send(&hello.to_bytes()).context("sending handshake")?;
        match transport.recv(&mut buf) {
            Ok(Some(n)) => match Message::from_bytes(&buf[..n]) {
                Ok(Message::Handshake { mode }) => {
                    info!("handshake acknowledged by peer (mode={mode:?})");
                    return Ok(());
                }
                _ => continue,
            },
            Ok(None) => {
                warn!("handshake attempt {attempt}/5 timed out, retrying");
            }
            Err(e) => warn!("handshake attempt {attempt}/5 failed: {e}"),
        }
    }
    anyhow::bail!("peer did not respond to handshake after 5 attempts")
}

fn now_micros() -> f64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1_000_000.0)
        .unwrap_or(0.0)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(level)
        .init();

    info!("clocksync v{}", env!("CARGO_PKG_VERSION"));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    match args.mode {
        Mode::Ref { bind_port } => run_reference(bind_port, running),
        Mode::Sync { bind_port, address, port, algorithm, output, calibrate_samples } => {
            run_sync(bind_port, address, port, algorithm, output, calibrate_samples, running)
        }
    }
}
