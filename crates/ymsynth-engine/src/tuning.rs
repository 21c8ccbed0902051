//! Pitch to chip period math
//!
//! Pitches are fractional MIDI note numbers. The tone counter completes one
//! square cycle every `16 * period` master clocks, so the period for a
//! frequency is `(clock / 16) / frequency`.

use ymsynth_chip::ChipMode;

const PERIOD_DENOMINATOR: f64 = 16.0;

/// Envelope steps per buzzer cycle divided by the tone half-cycle length
const ENVELOPE_PERIOD_DIVISOR: f64 = 16.0;

/// Largest 12-bit tone period
pub const MAX_TONE_PERIOD: u16 = 0x0FFF;

/// Frequency of a pitch in Hz for the given chip mode.
#[inline]
pub fn pitch_to_frequency(mode: ChipMode, pitch: f64) -> f64 {
    mode.lowest_note_frequency() * (pitch / 12.0).exp2()
}

/// Unrounded, unclamped tone period for a pitch.
#[inline]
pub fn period_for_pitch(mode: ChipMode, clock_rate: f64, pitch: f64) -> f64 {
    clock_rate / PERIOD_DENOMINATOR / mode.lowest_note_frequency() * (-pitch / 12.0).exp2()
}

/// 12-bit tone period for a pitch, rounded and clamped to `1..=4095`.
#[inline]
pub fn tone_period(mode: ChipMode, clock_rate: f64, pitch: f64) -> u16 {
    let period = period_for_pitch(mode, clock_rate, pitch);
    if period.is_nan() {
        return MAX_TONE_PERIOD;
    }
    period.round().clamp(1.0, f64::from(MAX_TONE_PERIOD)) as u16
}

/// Envelope period whose 32-step cycle matches the pitch.
#[inline]
pub fn envelope_period(mode: ChipMode, clock_rate: f64, pitch: f64) -> u16 {
    let period = period_for_pitch(mode, clock_rate, pitch) / ENVELOPE_PERIOD_DIVISOR;
    if period.is_nan() {
        return u16::MAX;
    }
    period.round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Frequency produced by a tone period at a given master clock.
#[inline]
pub fn period_to_frequency(clock_rate: f64, period: u16) -> f64 {
    if period == 0 {
        0.0
    } else {
        clock_rate / (PERIOD_DENOMINATOR * f64::from(period))
    }
}
