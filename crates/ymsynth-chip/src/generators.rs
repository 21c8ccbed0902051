//! Sound generators
//!
//! This module contains the individual generator components:
//! - Tone generators (3 channels)
//! - Noise generator (shared LFSR)
//! - Envelope generator (shared)
//!
//! All generators advance once per internal chip tick (master clock / 8).

use crate::constants::{MAX_ENVELOPE_LEVEL, NOISE_PERIOD_MASK, TONE_PERIOD_MASK};

/// Tone generator for a single channel
///
/// A 12-bit period counter that toggles a square output each time it reaches
/// the period, giving a 50% duty square at `clock / (16 * period)`.
#[derive(Clone, Debug)]
pub struct ToneGenerator {
    /// Current counter value
    counter: u32,
    /// Effective period (1..=4095)
    period: u32,
    /// Square output bit (0 or 1)
    output: u32,
}

impl ToneGenerator {
    /// Create a new tone generator
    pub fn new() -> Self {
        Self {
            counter: 0,
            period: 1,
            output: 0,
        }
    }

    /// Set the period; 0 behaves as 1 on hardware
    #[inline]
    pub fn set_period(&mut self, period: u16) {
        self.period = u32::from(period & TONE_PERIOD_MASK).max(1);
    }

    /// Get current period
    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Current output bit
    #[inline]
    pub fn output(&self) -> u32 {
        self.output
    }

    /// Tick the generator, returns the square output bit
    #[inline]
    pub fn tick(&mut self) -> u32 {
        self.counter += 1;
        if self.counter >= self.period {
            self.counter = 0;
            self.output ^= 1;
        }
        self.output
    }

    /// Place the generator at a fraction of its full cycle
    ///
    /// Phase 0 is the start of the low half, 0.5 the rising edge.
    pub fn set_phase(&mut self, phase: f64) {
        let cycle = 2 * self.period;
        let position = ((phase.rem_euclid(1.0) * cycle as f64) as u32).min(cycle - 1);
        if position >= self.period {
            self.output = 1;
            self.counter = position - self.period;
        } else {
            self.output = 0;
            self.counter = position;
        }
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.counter = 0;
        self.period = 1;
        self.output = 0;
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Noise generator using a 17-bit LFSR
///
/// The noise prescaler runs at half the tone generator rate, so the counter
/// rolls over after twice the programmed period.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    /// Current counter value
    counter: u32,
    /// Period (1..=31)
    period: u32,
    /// 17-bit LFSR state
    lfsr: u32,
}

impl NoiseGenerator {
    /// Create a new noise generator
    pub fn new() -> Self {
        Self {
            counter: 0,
            period: 1,
            lfsr: 1, // Must be non-zero
        }
    }

    /// Set the period; 0 behaves as 1
    #[inline]
    pub fn set_period(&mut self, period: u8) {
        self.period = u32::from(period & NOISE_PERIOD_MASK).max(1);
    }

    /// Get current period
    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Tick the generator, returns the current noise bit
    ///
    /// Feedback taps bits 0 and 3 into bit 16.
    #[inline]
    pub fn tick(&mut self) -> u32 {
        self.counter += 1;
        if self.counter >= self.period << 1 {
            self.counter = 0;
            let feedback = (self.lfsr ^ (self.lfsr >> 3)) & 1;
            self.lfsr = (self.lfsr >> 1) | (feedback << 16);
        }
        self.lfsr & 1
    }

    /// Raw shift register value
    #[inline]
    pub fn lfsr(&self) -> u32 {
        self.lfsr
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.counter = 0;
        self.period = 1;
        self.lfsr = 1;
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Action performed by one envelope segment on every envelope step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Segment {
    SlideUp,
    SlideDown,
    HoldTop,
    HoldBottom,
}

use Segment::{HoldBottom, HoldTop, SlideDown, SlideUp};

/// Segment pairs for the 16 shape codes
///
/// The first segment runs after a shape write; a slide that overflows
/// toggles to the other segment. Hold segments freeze the level.
const SHAPES: [[Segment; 2]; 16] = [
    [SlideDown, HoldBottom],
    [SlideDown, HoldBottom],
    [SlideDown, HoldBottom],
    [SlideDown, HoldBottom],
    [SlideUp, HoldBottom],
    [SlideUp, HoldBottom],
    [SlideUp, HoldBottom],
    [SlideUp, HoldBottom],
    [SlideDown, SlideDown],
    [SlideDown, HoldBottom],
    [SlideDown, SlideUp],
    [SlideDown, HoldTop],
    [SlideUp, SlideUp],
    [SlideUp, HoldTop],
    [SlideUp, SlideDown],
    [SlideUp, HoldBottom],
];

/// Envelope generator with 16 hardware shapes
#[derive(Clone, Debug)]
pub struct EnvelopeGenerator {
    /// Current counter value
    counter: u32,
    /// Period (1..=65535)
    period: u32,
    /// Selected shape (0..=15)
    shape: u8,
    /// Active segment (0 or 1)
    segment: usize,
    /// Current level (0..=31)
    level: i32,
}

impl EnvelopeGenerator {
    /// Create a new envelope generator
    pub fn new() -> Self {
        let mut envelope = Self {
            counter: 0,
            period: 1,
            shape: 0,
            segment: 0,
            level: 0,
        };
        envelope.restart();
        envelope
    }

    /// Set the period; 0 behaves as 1
    #[inline]
    pub fn set_period(&mut self, period: u16) {
        self.period = u32::from(period).max(1);
    }

    /// Get current period
    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Select a shape; this restarts the envelope
    #[inline]
    pub fn set_shape(&mut self, shape: u8) {
        self.shape = shape & 0x0F;
        self.restart();
    }

    /// Currently selected shape
    #[inline]
    pub fn shape(&self) -> u8 {
        self.shape
    }

    /// Restart the current shape from its first segment
    pub fn restart(&mut self) {
        self.counter = 0;
        self.segment = 0;
        self.reload_level();
    }

    /// Restart, then move forward by a fraction of one 32-step segment
    pub fn set_phase(&mut self, phase: f64) {
        self.restart();
        let position = phase.rem_euclid(1.0) * (MAX_ENVELOPE_LEVEL + 1) as f64;
        let steps = position as u32;
        for _ in 0..steps {
            self.step();
        }
        self.counter = ((position - steps as f64) * self.period as f64) as u32;
    }

    /// Tick the generator, returns the current level
    #[inline]
    pub fn tick(&mut self) -> i32 {
        self.counter += 1;
        if self.counter >= self.period {
            self.counter = 0;
            self.step();
        }
        self.level
    }

    /// Current envelope level (0-31)
    #[inline]
    pub fn level(&self) -> i32 {
        self.level
    }

    fn step(&mut self) {
        match SHAPES[self.shape as usize][self.segment] {
            SlideUp => {
                self.level += 1;
                if self.level > MAX_ENVELOPE_LEVEL {
                    self.next_segment();
                }
            }
            SlideDown => {
                self.level -= 1;
                if self.level < 0 {
                    self.next_segment();
                }
            }
            HoldTop | HoldBottom => {}
        }
    }

    fn next_segment(&mut self) {
        self.segment ^= 1;
        self.reload_level();
    }

    fn reload_level(&mut self) {
        self.level = match SHAPES[self.shape as usize][self.segment] {
            SlideDown | HoldTop => MAX_ENVELOPE_LEVEL,
            SlideUp | HoldBottom => 0,
        };
    }

    /// Reset to initial state
    pub fn reset(&mut self) {
        self.period = 1;
        self.shape = 0;
        self.restart();
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
