//! Sound chip core
//!
//! Emulates one YM2149 / AY-3-8910 instance at the internal clock rate of
//! master_clock / 8, oversamples the result 8x, decimates it to the host
//! sample rate and removes the DC offset.
//!
//! The noise and envelope generators are shared by all three channels just
//! as on hardware: whoever writes them last decides how they run.

use crate::constants::{
    CLOCK_DIVIDER, ChipMode, DECIMATE_FACTOR, MAX_VOLUME, NOISE_PERIOD_MASK, NUM_CHANNELS,
};
use crate::dc_filter::DcFilter;
use crate::generators::{EnvelopeGenerator, NoiseGenerator, ToneGenerator};
use crate::mixer::{Mixer, MixerFlags};
use crate::resampler::{CubicInterpolator, Decimator};
use crate::{ChipError, Result};

/// Default audio sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Upper bound on chip ticks per oversampled sub-sample
const MAX_TICKS_PER_SUBSAMPLE: f64 = 16.0;

/// Cycle-accurate sound chip with a band-limited stereo output stage
///
/// # Example
///
/// ```
/// use ymsynth_chip::{ChipCore, ChipMode};
///
/// let mut chip = ChipCore::with_config(ChipMode::Ym2149, 2_000_000.0, 44_100).unwrap();
/// chip.set_tone(0, 478);
/// chip.set_mixer(0, false, true, false);
/// chip.set_volume(0, 15);
///
/// let (left, right) = chip.process();
/// assert!(left.is_finite() && right.is_finite());
/// ```
#[derive(Clone, Debug)]
pub struct ChipCore {
    // Clock and timing
    mode: ChipMode,
    clock_rate: f64,
    sample_rate: u32,
    step: f64,
    position: f64,

    // Generators
    tone_generators: [ToneGenerator; NUM_CHANNELS],
    noise_generator: NoiseGenerator,
    envelope_generator: EnvelopeGenerator,

    // Output processing
    mixer: Mixer,
    interpolator_left: CubicInterpolator,
    interpolator_right: CubicInterpolator,
    decimator_left: Decimator,
    decimator_right: Decimator,
    dc_left: DcFilter,
    dc_right: DcFilter,

    left: f64,
    right: f64,
}

impl ChipCore {
    /// Create a YM2149 at its nominal clock and 44.1 kHz
    pub fn new() -> Self {
        let mode = ChipMode::default();
        let clock_rate = mode.default_clock_rate();
        let mut chip = Self {
            mode,
            clock_rate,
            sample_rate: DEFAULT_SAMPLE_RATE,
            step: Self::subsample_step(clock_rate, DEFAULT_SAMPLE_RATE),
            position: 0.0,
            tone_generators: Default::default(),
            noise_generator: NoiseGenerator::new(),
            envelope_generator: EnvelopeGenerator::new(),
            mixer: Mixer::new(),
            interpolator_left: CubicInterpolator::new(),
            interpolator_right: CubicInterpolator::new(),
            decimator_left: Decimator::new(),
            decimator_right: Decimator::new(),
            dc_left: DcFilter::new(),
            dc_right: DcFilter::new(),
            left: 0.0,
            right: 0.0,
        };
        chip.reset();
        chip
    }

    /// Create a chip with an explicit mode, master clock and sample rate
    pub fn with_config(mode: ChipMode, clock_rate: f64, sample_rate: u32) -> Result<Self> {
        let mut chip = Self::new();
        chip.configure(mode, clock_rate, sample_rate)?;
        Ok(chip)
    }

    fn subsample_step(clock_rate: f64, sample_rate: u32) -> f64 {
        clock_rate / (CLOCK_DIVIDER * DECIMATE_FACTOR as f64 * f64::from(sample_rate))
    }

    /// Select the chip variant and clocks, resetting all internal state
    ///
    /// This is the only call that clears the filter histories; it must not
    /// be issued while a render is in flight.
    pub fn configure(&mut self, mode: ChipMode, clock_rate: f64, sample_rate: u32) -> Result<()> {
        if !clock_rate.is_finite() || clock_rate <= 0.0 {
            return Err(ChipError::ConfigError(format!(
                "clock rate must be positive, got {clock_rate}"
            )));
        }
        if sample_rate == 0 {
            return Err(ChipError::ConfigError("sample rate must be positive".into()));
        }
        let step = Self::subsample_step(clock_rate, sample_rate);
        if step > MAX_TICKS_PER_SUBSAMPLE {
            return Err(ChipError::ConfigError(format!(
                "clock rate {clock_rate} Hz is too high for {sample_rate} Hz output"
            )));
        }

        self.mode = mode;
        self.clock_rate = clock_rate;
        self.sample_rate = sample_rate;
        self.step = step;
        self.reset();
        Ok(())
    }

    /// Reset generators, mixer and filter histories
    pub fn reset(&mut self) {
        for tone in &mut self.tone_generators {
            tone.reset();
        }
        self.noise_generator.reset();
        self.envelope_generator.reset();
        self.mixer.reset();
        self.interpolator_left.reset();
        self.interpolator_right.reset();
        self.decimator_left.reset();
        self.decimator_right.reset();
        self.dc_left.reset();
        self.dc_right.reset();
        self.position = 0.0;
        self.left = 0.0;
        self.right = 0.0;
    }

    /// Set a channel's 12-bit tone period (0 behaves as 1)
    #[inline]
    pub fn set_tone(&mut self, channel: usize, period: u16) {
        if let Some(tone) = self.tone_generators.get_mut(channel) {
            tone.set_period(period);
        }
    }

    /// Set a channel's mixer switches
    #[inline]
    pub fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) {
        if let Some(mix) = self.mixer.channels.get_mut(channel) {
            mix.flags = MixerFlags::from_switches(tone_off, noise_off, envelope_on);
        }
    }

    /// Set a channel's fixed volume (0-15)
    #[inline]
    pub fn set_volume(&mut self, channel: usize, volume: u8) {
        if let Some(mix) = self.mixer.channels.get_mut(channel) {
            mix.volume = volume & MAX_VOLUME;
        }
    }

    /// Place a channel in the stereo field (0 = left, 1 = right)
    #[inline]
    pub fn set_pan(&mut self, channel: usize, pan: f64, equal_power: bool) {
        if let Some(mix) = self.mixer.channels.get_mut(channel) {
            mix.set_pan(pan, equal_power);
        }
    }

    /// Set the shared noise period (0-31)
    #[inline]
    pub fn set_noise(&mut self, period: u8) {
        self.noise_generator.set_period(period & NOISE_PERIOD_MASK);
    }

    /// Set the shared envelope period (0 behaves as 1)
    #[inline]
    pub fn set_envelope(&mut self, period: u16) {
        self.envelope_generator.set_period(period);
    }

    /// Select the envelope shape (0-15); restarts the envelope
    #[inline]
    pub fn set_envelope_shape(&mut self, shape: u8) {
        self.envelope_generator.set_shape(shape);
    }

    /// Restart the envelope from the beginning of its current shape
    #[inline]
    pub fn restart_envelope(&mut self) {
        self.envelope_generator.restart();
    }

    /// Restart the envelope and move it forward by a fraction of one segment
    #[inline]
    pub fn set_envelope_phase(&mut self, phase: f64) {
        self.envelope_generator.set_phase(phase);
    }

    /// Move a tone generator to a fraction of its cycle
    #[inline]
    pub fn set_tone_phase(&mut self, channel: usize, phase: f64) {
        if let Some(tone) = self.tone_generators.get_mut(channel) {
            tone.set_phase(phase);
        }
    }

    /// Mute or unmute a channel in the output stage
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.mixer.set_mute(channel, mute);
    }

    /// Check whether a channel is muted
    pub fn is_channel_muted(&self, channel: usize) -> bool {
        self.mixer.is_muted(channel)
    }

    /// Run one chip tick and feed the interpolators
    #[inline]
    fn tick(&mut self) {
        let noise = self.noise_generator.tick();
        let envelope = self.envelope_generator.tick();
        let mut tones = [0u32; NUM_CHANNELS];
        for (bit, tone) in tones.iter_mut().zip(self.tone_generators.iter_mut()) {
            *bit = tone.tick();
        }

        let (left, right) = self
            .mixer
            .mix(tones, noise, envelope, self.mode.dac_table());
        self.interpolator_left.push(left);
        self.interpolator_right.push(right);
    }

    /// Generate the next stereo output sample
    pub fn process(&mut self) -> (f64, f64) {
        for _ in 0..DECIMATE_FACTOR {
            self.position += self.step;
            while self.position >= 1.0 {
                self.position -= 1.0;
                self.tick();
            }
            self.decimator_left
                .push(self.interpolator_left.sample(self.position));
            self.decimator_right
                .push(self.interpolator_right.sample(self.position));
        }

        let left = self.decimator_left.output();
        let right = self.decimator_right.output();
        self.left = self.dc_left.process(left);
        self.right = self.dc_right.process(right);
        (self.left, self.right)
    }

    /// Last left output sample
    #[inline]
    pub fn left(&self) -> f64 {
        self.left
    }

    /// Last right output sample
    #[inline]
    pub fn right(&self) -> f64 {
        self.right
    }

    /// Current square output bit of a channel's tone generator
    #[inline]
    pub fn tone_bit(&self, channel: usize) -> bool {
        self.tone_generators
            .get(channel)
            .is_some_and(|tone| tone.output() != 0)
    }

    /// Effective tone period of a channel
    pub fn tone_period(&self, channel: usize) -> u32 {
        self.tone_generators
            .get(channel)
            .map_or(0, ToneGenerator::period)
    }

    /// Fixed volume of a channel
    pub fn volume(&self, channel: usize) -> u8 {
        self.mixer.channels.get(channel).map_or(0, |c| c.volume)
    }

    /// Mixer switches of a channel
    pub fn mixer_flags(&self, channel: usize) -> MixerFlags {
        self.mixer
            .channels
            .get(channel)
            .map_or(MixerFlags::empty(), |c| c.flags)
    }

    /// Left/right gains of a channel
    pub fn pan_gains(&self, channel: usize) -> (f64, f64) {
        self.mixer
            .channels
            .get(channel)
            .map_or((0.0, 0.0), |c| (c.pan_left, c.pan_right))
    }

    /// Effective noise period
    pub fn noise_period(&self) -> u32 {
        self.noise_generator.period()
    }

    /// Effective envelope period
    pub fn envelope_period(&self) -> u32 {
        self.envelope_generator.period()
    }

    /// Selected envelope shape
    pub fn envelope_shape(&self) -> u8 {
        self.envelope_generator.shape()
    }

    /// Current envelope level (0-31)
    pub fn envelope_level(&self) -> i32 {
        self.envelope_generator.level()
    }

    /// Chip variant
    pub fn mode(&self) -> ChipMode {
        self.mode
    }

    /// Master clock in Hz
    pub fn clock_rate(&self) -> f64 {
        self.clock_rate
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Internal chip ticks per output sample
    pub fn ticks_per_sample(&self) -> f64 {
        self.step * DECIMATE_FACTOR as f64
    }
}

impl Default for ChipCore {
    fn default() -> Self {
        Self::new()
    }
}
