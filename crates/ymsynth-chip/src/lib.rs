//! YM2149 / AY-3-8910 sound chip emulation
//!
//! A cycle-accurate model of the three-channel programmable sound generator
//! found in the Atari ST, ZX Spectrum and Amstrad CPC, with a band-limited
//! stereo output stage suitable for direct use in an audio callback.
//!
//! # Features
//! - Three square-wave tone generators with 12-bit periods
//! - 17-bit LFSR noise generator shared by all channels
//! - Shared envelope generator with all 16 hardware shapes
//! - YM2149 (32-step) and AY-3-8910 (16-step) DAC curves
//! - 8x oversampling, windowed-sinc decimation and DC removal
//! - Per-channel stereo panning and mute
//!
//! # Quick start
//! ```
//! use ymsynth_chip::{ChipCore, ChipMode};
//!
//! let mut chip = ChipCore::with_config(ChipMode::Ay8910, 1_773_400.0, 48_000)?;
//! chip.set_tone(0, 252);
//! chip.set_mixer(0, false, true, false);
//! chip.set_volume(0, 12);
//!
//! let block: Vec<(f64, f64)> = (0..480).map(|_| chip.process()).collect();
//! assert_eq!(block.len(), 480);
//! # Ok::<(), ymsynth_chip::ChipError>(())
//! ```

#![warn(missing_docs)]

pub mod chip;
pub mod constants;
pub mod dc_filter;
pub mod generators;
pub mod mixer;
pub mod resampler;

pub use chip::{ChipCore, DEFAULT_SAMPLE_RATE};
pub use constants::{ChipMode, MAX_VOLUME, NUM_CHANNELS};
pub use mixer::MixerFlags;

/// Error types for chip emulation
#[derive(thiserror::Error, Debug)]
pub enum ChipError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type for chip operations
pub type Result<T> = std::result::Result<T, ChipError>;
