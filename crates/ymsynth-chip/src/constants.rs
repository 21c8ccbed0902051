//! Chip hardware constants
//!
//! DAC curves and timing constants shared by the generators and the output
//! stage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of tone channels on the chip
pub const NUM_CHANNELS: usize = 3;

/// Oversampling factor of the generator stage relative to the output rate
pub const DECIMATE_FACTOR: usize = 8;

/// Number of taps of the decimation filter
pub const FIR_SIZE: usize = 192;

/// Length of the DC blocker delay line (power of two)
pub const DC_FILTER_SIZE: usize = 1024;

/// Master clock divider of the internal generator tick
pub const CLOCK_DIVIDER: f64 = 8.0;

/// Tone period mask (12-bit register pair)
pub const TONE_PERIOD_MASK: u16 = 0x0FFF;

/// Noise period mask (5-bit register)
pub const NOISE_PERIOD_MASK: u8 = 0x1F;

/// Highest channel volume (4-bit register)
pub const MAX_VOLUME: u8 = 0x0F;

/// Highest envelope level (5-bit counter)
pub const MAX_ENVELOPE_LEVEL: i32 = 31;

/// AY-3-8910 DAC curve
///
/// The AY only resolves 16 amplitude steps; each step appears twice so that
/// both chips can be indexed with the same 5-bit level.
pub const AY8910_DAC_TABLE: [f64; 32] = [
    0.0,
    0.0,
    0.009_994_659_342_34,
    0.009_994_659_342_34,
    0.014_450_293_736_2,
    0.014_450_293_736_2,
    0.021_057_450_217_4,
    0.021_057_450_217_4,
    0.030_701_152_056_2,
    0.030_701_152_056_2,
    0.045_548_180_361_6,
    0.045_548_180_361_6,
    0.064_499_885_557_3,
    0.064_499_885_557_3,
    0.107_362_478_065,
    0.107_362_478_065,
    0.126_588_845_655,
    0.126_588_845_655,
    0.204_989_700_16,
    0.204_989_700_16,
    0.292_210_269_322,
    0.292_210_269_322,
    0.372_838_941_024,
    0.372_838_941_024,
    0.492_530_708_782,
    0.492_530_708_782,
    0.635_324_635_691,
    0.635_324_635_691,
    0.805_584_802_014,
    0.805_584_802_014,
    1.0,
    1.0,
];

/// YM2149 DAC curve (32 roughly logarithmic steps)
pub const YM2149_DAC_TABLE: [f64; 32] = [
    0.0,
    0.0,
    0.004_654_001_678_49,
    0.007_721_065_079_73,
    0.010_955_977_721_8,
    0.013_962_005_035_5,
    0.016_998_550_392_9,
    0.020_019_836_728_5,
    0.024_368_657_969,
    0.029_694_056_611,
    0.035_065_232_318_6,
    0.040_390_630_960_6,
    0.048_538_948_653_4,
    0.058_335_240_711_1,
    0.068_055_237_659_3,
    0.077_775_234_607_5,
    0.092_515_449_759_7,
    0.111_085_679_408,
    0.129_747_463_188,
    0.148_485_542_077,
    0.176_668_955_52,
    0.211_551_079_576,
    0.246_387_426_566,
    0.281_101_701_381,
    0.333_730_067_903,
    0.400_427_252_613,
    0.467_383_840_696,
    0.534_431_982_91,
    0.635_172_045_472,
    0.758_007_171_74,
    0.879_926_756_695,
    1.0,
];

/// Frequency of MIDI note 0 with A4 tuned to 440 Hz
const EQUAL_TEMPERED_NOTE_ZERO_HZ: f64 = 8.175_798_915_643_707;

/// Emulated chip variant
///
/// The two variants share the generator logic; they differ in the DAC curve
/// and in the tuning reference used to map pitches to periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipMode {
    /// Yamaha YM2149 (Atari ST)
    #[default]
    Ym2149,
    /// General Instrument AY-3-8910 (ZX Spectrum, Amstrad CPC)
    Ay8910,
}

impl ChipMode {
    /// DAC curve for this chip, indexed by 5-bit level
    #[inline]
    pub fn dac_table(self) -> &'static [f64; 32] {
        match self {
            ChipMode::Ym2149 => &YM2149_DAC_TABLE,
            ChipMode::Ay8910 => &AY8910_DAC_TABLE,
        }
    }

    /// Frequency of pitch 0 used for pitch to period conversion
    ///
    /// Both chips divide the master clock the same way in this emulation, so
    /// both references sit on the equal-tempered grid.
    #[inline]
    pub fn lowest_note_frequency(self) -> f64 {
        match self {
            // 2 MHz Atari ST: A4 lands on period 284 (440.1 Hz), no offset needed
            ChipMode::Ym2149 => EQUAL_TEMPERED_NOTE_ZERO_HZ,
            // 1.7734 MHz Spectrum: A4 lands on period 252 (439.8 Hz), no offset needed
            ChipMode::Ay8910 => EQUAL_TEMPERED_NOTE_ZERO_HZ,
        }
    }

    /// Nominal master clock of the machines this chip shipped in
    #[inline]
    pub fn default_clock_rate(self) -> f64 {
        match self {
            ChipMode::Ym2149 => 2_000_000.0,
            ChipMode::Ay8910 => 1_773_400.0,
        }
    }

    /// Parse a chip name as used on the command line
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ym" | "ym2149" => Some(ChipMode::Ym2149),
            "ay" | "ay8910" | "ay-3-8910" => Some(ChipMode::Ay8910),
            _ => None,
        }
    }

    /// Canonical name of the chip
    pub fn as_str(self) -> &'static str {
        match self {
            ChipMode::Ym2149 => "ym2149",
            ChipMode::Ay8910 => "ay8910",
        }
    }
}

impl fmt::Display for ChipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
