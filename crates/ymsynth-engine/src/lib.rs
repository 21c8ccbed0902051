//! Voice modulation engine for the YM2149 / AY-3-8910 chip core
//!
//! Turns note and controller events into chip register writes, one output
//! sample at a time. Each sounding note is a [`Voice`] bound to one of the
//! three chip channels; the [`Engine`] owns the chip, allocates voices per
//! play mode and renders the stereo stream.
//!
//! # Quick start
//! ```
//! use ymsynth_engine::{Engine, EngineConfig, Patch};
//!
//! let mut engine = Engine::new(EngineConfig::default())?;
//! engine.set_patch(Patch::default())?;
//! engine.note_on(0, 60, 100);
//!
//! let mut left = vec![0.0f32; 512];
//! let mut right = vec![0.0f32; 512];
//! engine.render(&mut left, &mut right);
//! assert!(left.iter().any(|s| *s != 0.0));
//! # Ok::<(), ymsynth_engine::SynthError>(())
//! ```

#![warn(missing_docs)]

pub mod controls;
pub mod engine;
pub mod envelope;
pub mod lfo;
pub mod patch;
pub mod ringmod;
pub mod sequencer;
pub mod tuning;
pub mod voice;

pub use controls::HostControls;
pub use engine::{Engine, EngineConfig};
pub use patch::{LfoWaveform, LoopMode, Patch, PlayMode, MAX_LEVEL};
pub use sequencer::HeldPitches;
pub use voice::Voice;
pub use ymsynth_chip::{ChipCore, ChipError, ChipMode};

/// Error types for the synthesis engine
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// Chip configuration rejected
    #[error("Chip error: {0}")]
    Chip(#[from] ChipError),

    /// Patch document could not be decoded
    #[error("Patch decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Patch value that cannot be clamped into range
    #[error("Invalid patch: {0}")]
    InvalidPatch(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, SynthError>;
