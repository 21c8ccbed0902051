//! Amplitude envelope, pitch envelope and portamento contours
//!
//! All contours are closed-form functions of the time since the event that
//! started them.

use crate::patch::{EnvelopeParams, PitchEnvelopeParams};

/// Linear interpolation of `t` over `[t0, t1]`
///
/// A zero-length or inverted interval yields the midpoint of the two values.
#[inline]
pub fn interpolate(t: f64, t0: f64, t1: f64, v0: f64, v1: f64) -> f64 {
    let span = t1 - t0;
    if span <= 0.0 {
        return 0.5 * (v0 + v1);
    }
    let x = ((t - t0) / span).clamp(0.0, 1.0);
    v0 + (v1 - v0) * x
}

/// Envelope level while the note is held
///
/// Attack rises from 0 to `hold1`, then `inter1`, `inter2` and `decay`
/// ramp on to `hold2`, `hold3` and `sustain`. Zero-length segments are
/// skipped.
pub fn held_level(env: &EnvelopeParams, t: f64) -> f64 {
    let segments = [
        (env.attack, env.hold1),
        (env.inter1, env.hold2),
        (env.inter2, env.hold3),
        (env.decay, env.sustain),
    ];
    let mut start = 0.0;
    let mut from = 0.0;
    for (duration, to) in segments {
        let end = start + duration;
        if t < end {
            return interpolate(t, start, end, from, to);
        }
        start = end;
        from = to;
    }
    env.sustain
}

/// Envelope level `t` seconds after note-off, starting from `start_level`
///
/// Reaches exactly 0 once `t >= release`.
#[inline]
pub fn release_level(start_level: f64, release: f64, t: f64) -> f64 {
    if t >= release {
        0.0
    } else {
        start_level * (1.0 - t / release)
    }
}

/// Pitch envelope offset in semitones
#[inline]
pub fn pitch_envelope_offset(params: &PitchEnvelopeParams, t: f64) -> f64 {
    if t >= params.time {
        0.0
    } else {
        interpolate(t, 0.0, params.time, params.pitch, 0.0)
    }
}

/// Normalised logistic curve on `[0, 1]` with `s(0) = 0` and `s(1) = 1`
///
/// `smoothness` in `[0, 1]` maps to steepness `1..=24`.
pub fn logistic(x: f64, smoothness: f64) -> f64 {
    let k = 1.0 + 23.0 * smoothness.clamp(0.0, 1.0);
    let sigmoid = |v: f64| 1.0 / (1.0 + (-v).exp());
    let low = sigmoid(-0.5 * k);
    let high = sigmoid(0.5 * k);
    let x = x.clamp(0.0, 1.0);
    (sigmoid(k * (x - 0.5)) - low) / (high - low)
}

/// Portamento glide from a previous pitch to the note pitch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glide {
    /// Pitch the glide starts from
    pub from: f64,
    /// Pitch the glide ends on
    pub to: f64,
    /// Glide time in seconds
    pub duration: f64,
}

impl Glide {
    /// Create a glide; returns `None` when there is nothing to glide
    pub fn new(from: f64, to: f64, duration: f64) -> Option<Self> {
        (duration > 0.0 && from != to).then_some(Self { from, to, duration })
    }

    /// Pitch offset `t` seconds into the glide
    #[inline]
    pub fn offset(&self, t: f64, smoothness: f64) -> f64 {
        if t >= self.duration {
            return 0.0;
        }
        (self.from - self.to) * (1.0 - logistic(t / self.duration, smoothness))
    }
}
