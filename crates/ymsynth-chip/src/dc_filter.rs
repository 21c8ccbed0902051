//! DC offset removal filter
//!
//! Square and noise waveforms gated through a unipolar DAC carry a DC offset
//! that varies with the audio content. This filter subtracts the running
//! average of the last `DC_FILTER_SIZE` samples.

use crate::constants::DC_FILTER_SIZE;

/// DC offset removal filter using a running average
///
/// The running sum follows `s[n] = s[n-1] + x[n] - x[n-N]`; the output is
/// `x[n] - s[n] / N`.
#[derive(Clone)]
pub struct DcFilter {
    /// Circular buffer of recent samples
    delay: Box<[f64; DC_FILTER_SIZE]>,
    /// Current write position in buffer
    position: usize,
    /// Running sum of all samples in buffer
    sum: f64,
}

impl DcFilter {
    /// Create a new DC filter
    pub fn new() -> Self {
        Self {
            delay: Box::new([0.0; DC_FILTER_SIZE]),
            position: 0,
            sum: 0.0,
        }
    }

    /// Process a sample and return the DC-adjusted value
    #[inline]
    pub fn process(&mut self, sample: f64) -> f64 {
        self.sum += sample - self.delay[self.position];
        self.delay[self.position] = sample;

        self.position = (self.position + 1) & (DC_FILTER_SIZE - 1);
        if self.position == 0 {
            // Re-derive the sum once per lap so rounding error cannot pile up
            self.sum = self.delay.iter().sum();
        }

        sample - self.sum / DC_FILTER_SIZE as f64
    }

    /// Reset the filter state
    pub fn reset(&mut self) {
        self.delay.fill(0.0);
        self.position = 0;
        self.sum = 0.0;
    }
}

impl Default for DcFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DcFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcFilter")
            .field("position", &self.position)
            .field("sum", &self.sum)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_filter_removes_offset() {
        let mut filter = DcFilter::new();

        let dc_value = 0.8;
        let mut output = 1.0;
        for _ in 0..DC_FILTER_SIZE * 2 {
            output = filter.process(dc_value);
        }

        assert!(
            output.abs() < 1e-12,
            "DC filter should remove constant offset, got {output}"
        );
    }

    #[test]
    fn test_dc_filter_zero_mean_for_square() {
        let mut filter = DcFilter::new();
        let square = |n: usize| if (n / 16) % 2 == 0 { 0.9 } else { 0.1 };

        for n in 0..DC_FILTER_SIZE {
            filter.process(square(n));
        }
        let mean: f64 = (DC_FILTER_SIZE..DC_FILTER_SIZE * 3)
            .map(|n| filter.process(square(n)))
            .sum::<f64>()
            / (DC_FILTER_SIZE * 2) as f64;
        assert!(mean.abs() < 1e-9, "running mean should vanish, got {mean}");
    }

    #[test]
    fn test_dc_filter_preserves_ac() {
        let mut filter = DcFilter::new();

        for _ in 0..DC_FILTER_SIZE * 2 {
            filter.process(0.25);
        }

        let output = filter.process(0.75);
        assert!(output > 0.49, "DC filter should pass AC component, got {output}");
    }

    #[test]
    fn test_dc_filter_reset() {
        let mut filter = DcFilter::new();

        for i in 0..100 {
            filter.process(i as f64 * 0.01);
        }

        filter.reset();

        assert_eq!(filter.position, 0);
        assert_eq!(filter.sum, 0.0);
    }
}
