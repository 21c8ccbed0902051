//! Rate conversion between the chip tick and the output sample rate
//!
//! The generators run at master clock / 8. Their output is placed on an
//! 8x oversampled grid by cubic interpolation and brought down to the host
//! rate by a windowed-sinc decimation filter.

use std::f64::consts::PI;

use crate::constants::{DECIMATE_FACTOR, FIR_SIZE};

/// 4-point cubic interpolator over the chip tick stream
#[derive(Clone, Debug, Default)]
pub struct CubicInterpolator {
    history: [f64; 4],
    coefficients: [f64; 3],
}

impl CubicInterpolator {
    /// Create an interpolator with silent history
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the value produced by one chip tick
    #[inline]
    pub fn push(&mut self, value: f64) {
        let y = &mut self.history;
        y[0] = y[1];
        y[1] = y[2];
        y[2] = y[3];
        y[3] = value;

        let slope = y[2] - y[0];
        self.coefficients[0] = 0.5 * y[1] + 0.25 * (y[0] + y[2]);
        self.coefficients[1] = 0.5 * slope;
        self.coefficients[2] = 0.25 * (y[3] - y[1] - slope);
    }

    /// Evaluate at a fractional position (0..1) between the last ticks
    #[inline]
    pub fn sample(&self, x: f64) -> f64 {
        let c = &self.coefficients;
        (c[2] * x + c[1]) * x + c[0]
    }

    /// Clear history
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Blackman-windowed sinc low-pass with its cutoff at the output Nyquist
/// frequency, normalised to unity gain at DC.
fn design_decimation_filter() -> [f64; FIR_SIZE] {
    let mut taps = [0.0; FIR_SIZE];
    let cutoff = 0.5 / DECIMATE_FACTOR as f64;
    let center = (FIR_SIZE - 1) as f64 / 2.0;
    let span = (FIR_SIZE - 1) as f64;

    for (n, tap) in taps.iter_mut().enumerate() {
        let t = n as f64 - center;
        let x = 2.0 * PI * cutoff * t;
        let sinc = if x.abs() < 1e-12 { 1.0 } else { x.sin() / x };
        let window = 0.42 - 0.5 * (2.0 * PI * n as f64 / span).cos()
            + 0.08 * (4.0 * PI * n as f64 / span).cos();
        *tap = 2.0 * cutoff * sinc * window;
    }

    let gain: f64 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= gain;
    }
    taps
}

/// Symmetric FIR decimator
///
/// History is stored twice in a ring so the convolution window is always a
/// contiguous slice.
#[derive(Clone)]
pub struct Decimator {
    taps: [f64; FIR_SIZE],
    history: [f64; FIR_SIZE * 2],
    index: usize,
}

impl Decimator {
    /// Create a decimator with precomputed coefficients
    pub fn new() -> Self {
        Self {
            taps: design_decimation_filter(),
            history: [0.0; FIR_SIZE * 2],
            index: 0,
        }
    }

    /// Append one oversampled value
    #[inline]
    pub fn push(&mut self, value: f64) {
        self.history[self.index] = value;
        self.history[self.index + FIR_SIZE] = value;
        self.index += 1;
        if self.index == FIR_SIZE {
            self.index = 0;
        }
    }

    /// Filter output for the most recent window
    #[inline]
    pub fn output(&self) -> f64 {
        let window = &self.history[self.index..self.index + FIR_SIZE];
        window
            .iter()
            .zip(self.taps.iter())
            .map(|(x, h)| x * h)
            .sum()
    }

    /// Filter coefficients
    pub fn taps(&self) -> &[f64; FIR_SIZE] {
        &self.taps
    }

    /// Clear history
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.index = 0;
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Decimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decimator")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
