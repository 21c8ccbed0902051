//! Pitch LFO and the stable pseudo-random source
//!
//! The LFO is evaluated in closed form from the voice's elapsed time, so a
//! long note never accumulates phase error.

use std::f64::consts::TAU;

use crate::patch::{LfoParams, LfoWaveform};

/// 32-bit integer avalanche hash
#[inline]
pub fn hash32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Hash of a 64-bit key
#[inline]
pub fn hash64(x: u64) -> u32 {
    hash32((x as u32) ^ hash32((x >> 32) as u32).wrapping_add(0x9e37_79b9))
}

/// Stable pseudo-random value in `[0, 1)` for a key
#[inline]
pub fn hash_unit(x: u64) -> f64 {
    f64::from(hash64(x)) / 4_294_967_296.0
}

/// Waveform value in `[-1, 1]` at a phase measured in cycles
pub fn waveform_value(waveform: LfoWaveform, phase: f64) -> f64 {
    let x = phase.rem_euclid(1.0);
    match waveform {
        LfoWaveform::Sine => (TAU * x).sin(),
        LfoWaveform::Triangle => {
            if x < 0.25 {
                4.0 * x
            } else if x < 0.75 {
                2.0 - 4.0 * x
            } else {
                4.0 * x - 4.0
            }
        }
        LfoWaveform::SawDown => 1.0 - 2.0 * x,
        LfoWaveform::SawUp => 2.0 * x - 1.0,
        LfoWaveform::Square => {
            if x < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        LfoWaveform::Random => {
            let half_cycle = (2.0 * phase).floor() as i64;
            2.0 * hash_unit(half_cycle as u64) - 1.0
        }
    }
}

/// Pitch offset in semitones after `elapsed` seconds of a note
///
/// `extra_depth` is added to the patch depth (modulation wheel).
pub fn pitch_offset(params: &LfoParams, tempo: f64, elapsed: f64, extra_depth: f64) -> f64 {
    let depth = params.depth + extra_depth;
    if depth == 0.0 {
        return 0.0;
    }
    let fade = if params.delay > 0.0 {
        (elapsed / params.delay).min(1.0)
    } else {
        1.0
    };
    let phase = params.phase + elapsed * params.rate(tempo);
    waveform_value(params.waveform, phase) * depth * fade
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash32(0), 0);
        assert_eq!(hash32(1), hash32(1));
        assert_ne!(hash32(1), hash32(2));
        assert_ne!(hash64(1), hash64(1 << 32));
        let u = hash_unit(12345);
        assert!((0.0..1.0).contains(&u));
    }

    #[test]
    fn test_waveform_shapes() {
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Sine, 0.25), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Triangle, 0.0), 0.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Triangle, 0.25), 1.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Triangle, 0.75), -1.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::SawDown, 0.0), 1.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::SawUp, 0.0), -1.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Square, 0.2), 1.0);
        assert_abs_diff_eq!(waveform_value(LfoWaveform::Square, 0.7), -1.0);
    }

    #[test]
    fn test_random_waveform_holds_per_half_cycle() {
        let a = waveform_value(LfoWaveform::Random, 0.1);
        let b = waveform_value(LfoWaveform::Random, 0.4);
        let c = waveform_value(LfoWaveform::Random, 0.6);
        assert_eq!(a, b);
        assert_ne!(a, c);
        for i in 0..100 {
            let v = waveform_value(LfoWaveform::Random, i as f64 * 0.37);
            assert!((-1.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_delay_fades_in() {
        let params = LfoParams {
            waveform: LfoWaveform::Square,
            depth: 2.0,
            delay: 1.0,
            ..Default::default()
        };
        assert_abs_diff_eq!(pitch_offset(&params, 120.0, 0.0, 0.0), 0.0);
        assert_abs_diff_eq!(pitch_offset(&params, 120.0, 0.5, 0.0).abs(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pitch_offset(&params, 120.0, 3.0, 0.0).abs(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rate_is_constant() {
        let params = LfoParams {
            waveform: LfoWaveform::SawUp,
            frequency: 0.0,
            depth: 1.0,
            phase: 0.75,
            ..Default::default()
        };
        let first = pitch_offset(&params, 120.0, 0.0, 0.0);
        assert_abs_diff_eq!(first, 0.5);
        assert_eq!(pitch_offset(&params, 120.0, 100.0, 0.0), first);
    }

    #[test]
    fn test_zero_depth_is_silent() {
        let params = LfoParams::default();
        assert_eq!(pitch_offset(&params, 120.0, 0.3, 0.0), 0.0);
        assert!(pitch_offset(&params, 120.0, 0.05, 1.0).abs() > 0.0);
    }
}
