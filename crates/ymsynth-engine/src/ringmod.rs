//! Ring modulation waveform player
//!
//! Steps through a 32-entry amplitude table at a rate tied to a modulator
//! pitch. Phase is kept in chip ticks and wrapped by subtraction every time
//! a segment boundary is crossed, so it stays bounded on arbitrarily long
//! notes.

use crate::patch::{LoopMode, MAX_LEVEL, WAVEFORM_SIZE};

/// Shortest segment length in chip ticks
const MIN_SEGMENT_TICKS: f64 = 1.0 / 16.0;

/// Table cursor with phase accumulator
#[derive(Debug, Clone, PartialEq)]
pub struct RingModulator {
    /// Chip ticks elapsed in the current segment
    phase: f64,
    index: usize,
    /// Travel direction for ping-pong looping
    forward: bool,
}

impl RingModulator {
    /// Create a modulator at the start of the table
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            index: 0,
            forward: true,
        }
    }

    /// Place the cursor at a fraction of one full table cycle
    pub fn reset_phase(&mut self, phase: f64, segment_ticks: f64) {
        let position = phase.rem_euclid(1.0) * WAVEFORM_SIZE as f64;
        self.index = (position as usize).min(WAVEFORM_SIZE - 1);
        self.phase = position.fract() * segment_ticks.max(MIN_SEGMENT_TICKS);
        self.forward = true;
    }

    /// Restart the table (tone sync)
    #[inline]
    pub fn sync(&mut self) {
        self.phase = 0.0;
        self.index = 0;
        self.forward = true;
    }

    /// Advance by `ticks` chip ticks with segments `segment_ticks` long
    #[inline]
    pub fn advance(&mut self, ticks: f64, segment_ticks: f64, loop_mode: LoopMode) {
        let segment = segment_ticks.max(MIN_SEGMENT_TICKS);
        self.phase += ticks;
        while self.phase >= segment {
            self.phase -= segment;
            self.step(loop_mode);
        }
    }

    /// Cross one segment boundary
    pub fn step(&mut self, loop_mode: LoopMode) {
        let last = WAVEFORM_SIZE - 1;
        match loop_mode {
            LoopMode::Off => self.index = (self.index + 1).min(last),
            LoopMode::Forward => self.index = (self.index + 1) % WAVEFORM_SIZE,
            LoopMode::PingPong => {
                if self.forward {
                    self.index += 1;
                    if self.index >= last {
                        self.index = last;
                        self.forward = false;
                    }
                } else {
                    self.index = self.index.saturating_sub(1);
                    if self.index == 0 {
                        self.forward = true;
                    }
                }
            }
        }
    }

    /// Current table index
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// True while moving towards the end of the table
    #[inline]
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Ticks elapsed in the current segment
    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Amplitude factor: `1 - depth` for an empty entry, 1 for a full one
    #[inline]
    pub fn level(&self, waveform: &[f64; WAVEFORM_SIZE], depth: f64) -> f64 {
        let entry = (waveform[self.index] / MAX_LEVEL).clamp(0.0, 1.0);
        (1.0 - depth) + depth * entry
    }
}

impl Default for RingModulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_wraps_after_table_size() {
        let mut rm = RingModulator::new();
        for crossing in 1..=WAVEFORM_SIZE {
            rm.step(LoopMode::Forward);
            if crossing < WAVEFORM_SIZE {
                assert_eq!(rm.index(), crossing);
            }
        }
        assert_eq!(rm.index(), 0);
    }

    #[test]
    fn test_ping_pong_round_trip() {
        let mut rm = RingModulator::new();
        for _ in 0..(WAVEFORM_SIZE - 1) {
            rm.step(LoopMode::PingPong);
        }
        assert_eq!(rm.index(), WAVEFORM_SIZE - 1);
        assert!(!rm.is_forward());
        for _ in 0..(WAVEFORM_SIZE - 1) {
            rm.step(LoopMode::PingPong);
        }
        assert_eq!(rm.index(), 0);
        assert!(rm.is_forward());
    }

    #[test]
    fn test_ping_pong_from_middle() {
        let mut rm = RingModulator::new();
        rm.reset_phase(0.5, 10.0);
        let start = (rm.index(), rm.is_forward());
        for _ in 0..2 * (WAVEFORM_SIZE - 1) {
            rm.step(LoopMode::PingPong);
        }
        assert_eq!((rm.index(), rm.is_forward()), start);
    }

    #[test]
    fn test_off_freezes_on_last_entry() {
        let mut rm = RingModulator::new();
        for _ in 0..100 {
            rm.step(LoopMode::Off);
        }
        assert_eq!(rm.index(), WAVEFORM_SIZE - 1);
    }

    #[test]
    fn test_advance_crosses_segments() {
        let mut rm = RingModulator::new();
        rm.advance(25.0, 10.0, LoopMode::Forward);
        assert_eq!(rm.index(), 2);
        assert!((rm.phase() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_phase_stays_bounded() {
        let mut rm = RingModulator::new();
        // ~10 minutes at 44.1 kHz with 5.67 ticks per sample
        for _ in 0..26_460_000u32 {
            rm.advance(5.668_934_240_362_812, 29.875, LoopMode::PingPong);
            assert!(rm.phase() < 29.875);
        }
        assert!(rm.index() < WAVEFORM_SIZE);
    }

    #[test]
    fn test_sync_and_reset_phase() {
        let mut rm = RingModulator::new();
        rm.reset_phase(0.25, 8.0);
        assert_eq!(rm.index(), 8);
        assert_eq!(rm.phase(), 0.0);
        rm.reset_phase(0.265_625, 8.0);
        assert_eq!(rm.index(), 8);
        assert!((rm.phase() - 4.0).abs() < 1e-9);
        rm.sync();
        assert_eq!((rm.index(), rm.phase(), rm.is_forward()), (0, 0.0, true));
    }

    #[test]
    fn test_level_blends_depth() {
        let mut waveform = [0.0; WAVEFORM_SIZE];
        waveform[1] = MAX_LEVEL;
        let mut rm = RingModulator::new();
        assert_eq!(rm.level(&waveform, 0.0), 1.0);
        assert_eq!(rm.level(&waveform, 0.75), 0.25);
        rm.step(LoopMode::Forward);
        assert_eq!(rm.level(&waveform, 0.75), 1.0);
    }
}
