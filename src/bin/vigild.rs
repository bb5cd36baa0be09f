//! vigild - driver vigilance monitoring daemon
//!
//! This daemon:
//! 1. Pulls frames at the configured rate (synthetic stub in this build;
//!    real camera ingestion is an external collaborator)
//! 2. Runs the registered detector backend on each frame
//! 3. Feeds the resulting observations into the debounce session
//! 4. Logs every Alert <-> Drowsy transition and periodic health lines

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil_monitor::detect::{BackendRegistry, SyntheticEarBackend};
use vigil_monitor::{FrameObservation, LogSink, MonitorConfig, MonitorSession};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Detector backend to drive the session.
    #[arg(long, default_value = "synthetic-ear")]
    backend: String,
    /// Stop after this many frames (0 = run until interrupted).
    #[arg(long, default_value_t = 0)]
    max_frames: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let cfg = MonitorConfig::load()?;

    let mut registry = BackendRegistry::new();
    registry.register(SyntheticEarBackend::default());
    registry.set_default(&args.backend)?;
    if let Some(backend) = registry.default_backend() {
        backend
            .lock()
            .map_err(|_| anyhow::anyhow!("backend lock poisoned"))?
            .warm_up()?;
    }

    let mut session = MonitorSession::new(cfg.thresholds, cfg.driver_subject.clone());
    session.add_sink(Box::new(LogSink));

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    log::info!(
        "vigild running. driver subject {}, backend {}",
        cfg.driver_subject,
        args.backend
    );
    log::info!(
        "entry debounce {} frames, recovery {} frames, dropout tolerance {}, intensity threshold {:.2}",
        cfg.thresholds.consecutive_positive_frames(),
        cfg.thresholds.recovery_frames(),
        cfg.thresholds.consecutive_missing_frames(),
        cfg.thresholds.intensity_threshold()
    );

    let frame_interval = Duration::from_millis(1000 / u64::from(cfg.target_fps));
    let mut seq = 0u64;
    let mut last_health_log = Instant::now();

    while running.load(Ordering::SeqCst) {
        // Stub acquisition: no camera in this build, the backend
        // synthesizes its own signal.
        let score = match registry.detect(&[], 0, 0) {
            Ok(score) => score,
            Err(e) => {
                // A failed inference is absorbed as a no-detection frame;
                // a dropped frame must never take down the loop.
                log::warn!("detector error at seq {}: {}", seq, e);
                None
            }
        };

        let observation = FrameObservation { seq, score };
        session.observe(&cfg.driver_subject, observation);
        seq += 1;

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "driver state={:?} frames={} transitions={}",
                session.driver_state(),
                seq,
                session.transition_count()
            );
            last_health_log = Instant::now();
        }

        if args.max_frames != 0 && seq >= args.max_frames {
            break;
        }
        std::thread::sleep(frame_interval);
    }

    log::info!(
        "vigild stopping. frames={} transitions={} final driver state={:?}",
        seq,
        session.transition_count(),
        session.driver_state()
    );
    Ok(())
}
