//! Offline renderer for the YM2149 voice engine.
//!
//! Loads a patch and a timed event score, plays the score through the engine
//! and writes the result as a 16-bit stereo WAV file.

mod render;
mod score;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ymsynth_engine::{ChipMode, Engine, EngineConfig, Patch};

use render::{render_score, write_wav};
use score::Score;

#[derive(Parser)]
#[command(name = "ymsynth")]
#[command(about = "Render a note score through a YM2149 patch into a WAV file")]
struct Args {
    /// Patch JSON file (defaults to a plain square tone)
    #[arg(short, long)]
    patch: Option<PathBuf>,

    /// Score JSON file
    #[arg(short, long)]
    score: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    out: PathBuf,

    /// Chip variant: ym2149 or ay8910
    #[arg(long, default_value = "ym2149", value_parser = parse_chip)]
    chip: ChipMode,

    /// Master clock in Hz (defaults to the chip's nominal clock)
    #[arg(long)]
    clock: Option<f64>,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 44_100)]
    rate: u32,

    /// Seconds rendered after the last event
    #[arg(long, default_value_t = 1.0)]
    tail: f64,

    /// Seed for voice allocation
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_chip(value: &str) -> std::result::Result<ChipMode, String> {
    ChipMode::from_name(value).ok_or_else(|| format!("unknown chip '{value}' (ym2149, ay8910)"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let patch = match &args.patch {
        Some(path) => {
            Patch::load(path).with_context(|| format!("failed to load patch {}", path.display()))?
        }
        None => Patch::default(),
    };
    let score = Score::load(&args.score)?;
    if score.is_empty() {
        return Err(anyhow!("score {} has no events", args.score.display()));
    }

    let config = EngineConfig {
        chip_mode: args.chip,
        clock_rate: args.clock.unwrap_or_else(|| args.chip.default_clock_rate()),
        sample_rate: args.rate,
        seed: args.seed,
    };
    let mut engine = Engine::new(config).context("invalid chip configuration")?;
    engine.set_patch(patch).context("invalid patch")?;
    info!(chip = %args.chip, rate = args.rate, events = score.events().len(), "rendering");

    let buffer = render_score(&mut engine, &score, args.tail);
    write_wav(&args.out, &buffer, args.rate)?;

    let seconds = buffer.frames() as f64 / f64::from(args.rate);
    let peak = buffer.peak();
    let peak_db = if peak > 0.0 {
        format!("{:.1} dBFS", 20.0 * peak.log10())
    } else {
        "silent".to_string()
    };
    println!(
        "Wrote {} ({:.2}s, {} frames, peak {})",
        args.out.display(),
        seconds,
        buffer.frames(),
        peak_db
    );
    Ok(())
}
