//! vigil_replay - replay a captured observation trace through a fresh session
//!
//! Reads one JSON `FrameObservation` per input line and writes one JSON
//! `TransitionEvent` per transition. Identical traces always produce
//! identical event streams, which makes this the tool for diffing
//! threshold changes against recorded drives.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::{BufRead, BufReader, Write};

use vigil_monitor::{FrameObservation, MonitorConfig, MonitorSession, SubjectKey};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the observation trace (JSONL, one FrameObservation per line).
    #[arg(long)]
    input: String,
    /// Output path for transition events ("-" = stdout).
    #[arg(long, default_value = "-")]
    output: String,
    /// Subject key the trace belongs to.
    #[arg(long, default_value = "subject:driver")]
    subject: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let cfg = MonitorConfig::load()?;
    let subject = SubjectKey::new(args.subject);
    let mut session = MonitorSession::new(cfg.thresholds, subject.clone());

    let file = std::fs::File::open(&args.input)
        .map_err(|e| anyhow!("failed to open trace {}: {}", args.input, e))?;
    let reader = BufReader::new(file);

    let mut out: Box<dyn Write> = match args.output.as_str() {
        "-" => Box::new(std::io::stdout().lock()),
        path => Box::new(
            std::fs::File::create(path)
                .map_err(|e| anyhow!("failed to create output {}: {}", path, e))?,
        ),
    };

    let mut frames = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| anyhow!("failed to read trace line {}: {}", line_no + 1, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let observation: FrameObservation = serde_json::from_str(&line)
            .map_err(|e| anyhow!("invalid observation on line {}: {}", line_no + 1, e))?;
        frames += 1;
        if let Some(event) = session.observe(&subject, observation) {
            serde_json::to_writer(&mut out, &event)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;

    eprintln!(
        "replayed {} frames, {} transitions, final state {:?}",
        frames,
        session.transition_count(),
        session.current_state(&subject)
    );
    Ok(())
}
