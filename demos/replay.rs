//! Replays recorded detections through the tracker.
//!
//! Input is one JSON frame per line:
//! `{"timestamp": 0.04, "detections": [{"class": "player", "confidence": 0.9, "bbox": [x1, y1, x2, y2]}]}`
//! Output is one JSON `FrameTracks` per line on stdout.
//!
//! cargo run --example replay -- detections.jsonl [config.json]

use anyhow::Context;
use fieldtrack::{FieldTracker, FieldTrackerConfig, Frame, Tracking};
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let in_file_name = args.next().context("expected detections file name")?;

    let config: FieldTrackerConfig = match args.next() {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            serde_json::from_str(&text).context("parsing config")?
        }
        None => FieldTrackerConfig::default(),
    };

    let mut tracker = FieldTracker::new(config)?;

    let dets_file = std::fs::File::open(&in_file_name)
        .with_context(|| format!("opening {}", in_file_name))?;
    let reader = std::io::BufReader::new(dets_file);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(err) => {
                eprintln!("line {}: wrong file format: {}", line_no + 1, err);
                continue;
            }
        };

        let tracks = tracker.update(&frame)?;
        writeln!(out, "{}", serde_json::to_string(&tracks)?)?;
    }

    Ok(())
}
