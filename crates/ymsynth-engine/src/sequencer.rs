//! Step sequencer clock, arpeggiator selection and the held-pitch set

use crate::lfo::hash64;
use crate::patch::PlayMode;

/// Number of distinct MIDI pitches
const PITCH_COUNT: usize = 128;

/// Currently held pitches as an ascending multiset
///
/// Storage is reserved up front so inserts never allocate while fewer than
/// 128 keys are down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldPitches {
    pitches: Vec<u8>,
}

impl HeldPitches {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            pitches: Vec::with_capacity(PITCH_COUNT),
        }
    }

    /// Add one occurrence of a pitch
    pub fn insert(&mut self, pitch: u8) {
        let position = self.pitches.partition_point(|&p| p <= pitch);
        self.pitches.insert(position, pitch);
    }

    /// Remove one occurrence of a pitch; false if it was not held
    pub fn remove(&mut self, pitch: u8) -> bool {
        match self.pitches.binary_search(&pitch) {
            Ok(position) => {
                self.pitches.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Remove and return the highest pitch
    pub fn pop(&mut self) -> Option<u8> {
        self.pitches.pop()
    }

    /// Check whether a pitch is held
    pub fn contains(&self, pitch: u8) -> bool {
        self.pitches.binary_search(&pitch).is_ok()
    }

    /// Pitch at an ascending position
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.pitches.get(index).copied()
    }

    /// Number of held notes, counting repeats
    #[inline]
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    /// True when no note is held
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Release everything
    pub fn clear(&mut self) {
        self.pitches.clear();
    }

    /// Held pitches in ascending order
    pub fn as_slice(&self) -> &[u8] {
        &self.pitches
    }
}

impl Default for HeldPitches {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole steps elapsed after `samples` samples at `frequency` steps per second
#[inline]
pub fn step_count(samples: u64, frequency: f64, sample_rate: f64) -> u64 {
    if frequency <= 0.0 || sample_rate <= 0.0 {
        return 0;
    }
    let steps = (samples as f64 * frequency / sample_rate).floor();
    if steps.is_finite() { steps as u64 } else { 0 }
}

/// Active sequencer index for a raw step count
///
/// Counts below `end` play straight through. Past `end` the count wraps
/// within `[loop_start, end)`, or returns -1 when there is no loop. An `end`
/// of zero or less disables the sequencer.
pub fn step_index(count: u64, loop_start: i32, end: i32) -> i32 {
    if end <= 0 {
        return -1;
    }
    let end_step = end as u64;
    if count < end_step {
        return count as i32;
    }
    if loop_start < 0 || loop_start >= end {
        return -1;
    }
    let start = loop_start as u64;
    (start + (count - start) % (end_step - start)) as i32
}

/// Position in an ordered arpeggio pass
///
/// The first pass visits every held pitch; later passes restart at `repeat`
/// (clamped to the last pitch).
#[inline]
fn arpeggio_position(count: u64, len: u64, repeat: u64) -> u64 {
    if count < len {
        return count;
    }
    let repeat = repeat.min(len - 1);
    repeat + (count - repeat) % (len - repeat)
}

/// Index into the held pitches for an arpeggio step
///
/// `repeat` is the position the up and down patterns return to after the
/// first pass. `previous` is the index chosen on the last step; the random
/// mode never repeats it while more than one pitch is held.
pub fn arpeggio_index(
    mode: PlayMode,
    count: u64,
    len: usize,
    repeat: usize,
    previous: Option<usize>,
    seed: u64,
) -> usize {
    if len <= 1 {
        return 0;
    }
    let len_u64 = len as u64;
    let position = || arpeggio_position(count, len_u64, repeat as u64) as usize;
    match mode {
        PlayMode::ArpDown => len - 1 - position(),
        PlayMode::ArpRandom => {
            let roll = u64::from(hash64(seed ^ count.wrapping_mul(0x9e37_79b9_7f4a_7c15)));
            match previous.filter(|&p| p < len) {
                Some(previous) => {
                    let pick = (roll % (len_u64 - 1)) as usize;
                    if pick >= previous { pick + 1 } else { pick }
                }
                None => (roll % len_u64) as usize,
            }
        }
        _ => position(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_pitches_is_sorted_multiset() {
        let mut held = HeldPitches::new();
        for pitch in [67, 60, 64, 60] {
            held.insert(pitch);
        }
        assert_eq!(held.as_slice(), &[60, 60, 64, 67]);
        assert!(held.remove(60));
        assert_eq!(held.as_slice(), &[60, 64, 67]);
        assert!(!held.remove(61));
        assert!(held.contains(64));
        assert_eq!(held.pop(), Some(67));
        assert_eq!(held.len(), 2);
        held.clear();
        assert!(held.is_empty());
    }

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(0, 100.0, 44_100.0), 0);
        assert_eq!(step_count(440, 100.0, 44_100.0), 0);
        assert_eq!(step_count(441, 100.0, 44_100.0), 1);
        assert_eq!(step_count(44_100, 100.0, 44_100.0), 100);
        assert_eq!(step_count(1_000, 0.0, 44_100.0), 0);
    }

    #[test]
    fn test_step_index_loops() {
        assert_eq!(step_index(5, 0, 0), -1);
        assert_eq!(step_index(3, 2, 6), 3);
        assert_eq!(step_index(6, 2, 6), 2);
        assert_eq!(step_index(9, 2, 6), 5);
        assert_eq!(step_index(10, 2, 6), 2);
        assert_eq!(step_index(6, -1, 6), -1);
        assert_eq!(step_index(100, 7, 6), -1);
    }

    #[test]
    fn test_arpeggio_up_and_down() {
        let up: Vec<usize> = (0..6)
            .map(|c| arpeggio_index(PlayMode::ArpUp, c, 3, 0, None, 0))
            .collect();
        assert_eq!(up, vec![0, 1, 2, 0, 1, 2]);
        let down: Vec<usize> = (0..6)
            .map(|c| arpeggio_index(PlayMode::ArpDown, c, 3, 0, None, 0))
            .collect();
        assert_eq!(down, vec![2, 1, 0, 2, 1, 0]);
        assert_eq!(arpeggio_index(PlayMode::ArpUp, 7, 1, 0, None, 0), 0);
    }

    #[test]
    fn test_arpeggio_repeat_point() {
        let up: Vec<usize> = (0..9)
            .map(|c| arpeggio_index(PlayMode::ArpUp, c, 4, 2, None, 0))
            .collect();
        assert_eq!(up, vec![0, 1, 2, 3, 2, 3, 2, 3, 2]);
        let down: Vec<usize> = (0..7)
            .map(|c| arpeggio_index(PlayMode::ArpDown, c, 3, 1, None, 0))
            .collect();
        assert_eq!(down, vec![2, 1, 0, 1, 0, 1, 0]);
        // Past the end it holds the last pitch
        let held: Vec<usize> = (0..6)
            .map(|c| arpeggio_index(PlayMode::ArpUp, c, 3, 9, None, 0))
            .collect();
        assert_eq!(held, vec![0, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn test_arpeggio_random_never_repeats() {
        let mut previous = None;
        for count in 0..1_000 {
            let index = arpeggio_index(PlayMode::ArpRandom, count, 3, 1, previous, 42);
            assert!(index < 3);
            assert_ne!(Some(index), previous);
            previous = Some(index);
        }
    }

    #[test]
    fn test_arpeggio_random_is_reproducible() {
        let run = |seed| -> Vec<usize> {
            let mut previous = None;
            (0..32)
                .map(|count| {
                    let index = arpeggio_index(PlayMode::ArpRandom, count, 4, 0, previous, seed);
                    previous = Some(index);
                    index
                })
                .collect()
        };
        assert_eq!(run(7), run(7));
    }
}
