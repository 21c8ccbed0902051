//! Channel mixer and stereo output stage
//!
//! Gates each channel with its tone/noise mixer flags, selects the fixed
//! volume or the shared envelope level, maps the level through the DAC curve
//! and spreads the result over the stereo field.

use bitflags::bitflags;

use crate::constants::{MAX_VOLUME, NUM_CHANNELS};

bitflags! {
    /// Per-channel mixer control
    ///
    /// Tone and noise bits are "off" flags, mirroring the inverted enables of
    /// the hardware mixer register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MixerFlags: u8 {
        /// Tone generator does not gate this channel
        const TONE_OFF = 0x01;
        /// Noise generator does not gate this channel
        const NOISE_OFF = 0x02;
        /// Amplitude comes from the shared envelope instead of the volume
        const ENVELOPE_ON = 0x04;
    }
}

impl MixerFlags {
    /// Build flags from the three mixer switches
    pub fn from_switches(tone_off: bool, noise_off: bool, envelope_on: bool) -> Self {
        let mut flags = MixerFlags::empty();
        flags.set(MixerFlags::TONE_OFF, tone_off);
        flags.set(MixerFlags::NOISE_OFF, noise_off);
        flags.set(MixerFlags::ENVELOPE_ON, envelope_on);
        flags
    }
}

/// Output state of one channel
#[derive(Clone, Debug)]
pub struct ChannelMix {
    /// Mixer switches
    pub flags: MixerFlags,
    /// Fixed volume (0-15)
    pub volume: u8,
    /// Left gain
    pub pan_left: f64,
    /// Right gain
    pub pan_right: f64,
    /// User mute flag
    pub muted: bool,
}

impl Default for ChannelMix {
    fn default() -> Self {
        let mut channel = Self {
            flags: MixerFlags::empty(),
            volume: 0,
            pan_left: 0.0,
            pan_right: 0.0,
            muted: false,
        };
        channel.set_pan(0.5, false);
        channel
    }
}

impl ChannelMix {
    /// Place the channel in the stereo field (0 = left, 1 = right)
    pub fn set_pan(&mut self, pan: f64, equal_power: bool) {
        let pan = pan.clamp(0.0, 1.0);
        if equal_power {
            self.pan_left = (1.0 - pan).sqrt();
            self.pan_right = pan.sqrt();
        } else {
            self.pan_left = 1.0 - pan;
            self.pan_right = pan;
        }
    }

    /// 5-bit DAC index for the current generator outputs
    #[inline]
    pub fn level_index(&self, tone: u32, noise: u32, envelope: i32) -> usize {
        let tone_off = u32::from(self.flags.contains(MixerFlags::TONE_OFF));
        let noise_off = u32::from(self.flags.contains(MixerFlags::NOISE_OFF));
        let gate = (tone | tone_off) & (noise | noise_off);
        let level = if self.flags.contains(MixerFlags::ENVELOPE_ON) {
            envelope as u32
        } else {
            u32::from(self.volume & MAX_VOLUME) * 2 + 1
        };
        (gate * level) as usize
    }
}

/// Audio mixer and output stage
#[derive(Clone, Debug, Default)]
pub struct Mixer {
    /// Per-channel state
    pub channels: [ChannelMix; NUM_CHANNELS],
}

impl Mixer {
    /// Create a new mixer
    pub fn new() -> Self {
        Self::default()
    }

    /// Mix one chip tick into a stereo pair
    #[inline]
    pub fn mix(
        &self,
        tones: [u32; NUM_CHANNELS],
        noise: u32,
        envelope: i32,
        dac: &[f64; 32],
    ) -> (f64, f64) {
        let mut left = 0.0;
        let mut right = 0.0;
        for (channel, &tone) in self.channels.iter().zip(tones.iter()) {
            if channel.muted {
                continue;
            }
            let amplitude = dac[channel.level_index(tone, noise, envelope)];
            left += amplitude * channel.pan_left;
            right += amplitude * channel.pan_right;
        }
        (left, right)
    }

    /// Set mute state for a channel
    #[inline]
    pub fn set_mute(&mut self, channel: usize, muted: bool) {
        if channel < NUM_CHANNELS {
            self.channels[channel].muted = muted;
        }
    }

    /// Check if channel is muted
    #[inline]
    pub fn is_muted(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(|c| c.muted)
    }

    /// Reset mixer state
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            let muted = channel.muted;
            *channel = ChannelMix::default();
            // Note: mute state preserved
            channel.muted = muted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::YM2149_DAC_TABLE;
    use approx::assert_relative_eq;

    #[test]
    fn test_level_index_volume() {
        let mut channel = ChannelMix::default();
        channel.volume = 15;
        assert_eq!(channel.level_index(1, 0, 0), 0); // noise gate closed
        channel.flags = MixerFlags::NOISE_OFF;
        assert_eq!(channel.level_index(1, 0, 0), 31);
        assert_eq!(channel.level_index(0, 0, 0), 0);
    }

    #[test]
    fn test_level_index_all_off_is_constant() {
        let mut channel = ChannelMix::default();
        channel.flags = MixerFlags::TONE_OFF | MixerFlags::NOISE_OFF;
        channel.volume = 7;
        assert_eq!(channel.level_index(0, 0, 0), 15);
        assert_eq!(channel.level_index(1, 1, 0), 15);
    }

    #[test]
    fn test_level_index_envelope() {
        let mut channel = ChannelMix::default();
        channel.flags = MixerFlags::from_switches(false, true, true);
        channel.volume = 3;
        assert_eq!(channel.level_index(1, 0, 22), 22);
        assert_eq!(channel.level_index(0, 0, 22), 0);
    }

    #[test]
    fn test_pan_laws() {
        let mut channel = ChannelMix::default();
        channel.set_pan(0.5, true);
        assert_relative_eq!(channel.pan_left, 0.5f64.sqrt());
        assert_relative_eq!(channel.pan_right, 0.5f64.sqrt());

        channel.set_pan(0.25, false);
        assert_relative_eq!(channel.pan_left, 0.75);
        assert_relative_eq!(channel.pan_right, 0.25);

        channel.set_pan(4.0, false);
        assert_relative_eq!(channel.pan_right, 1.0);
    }

    #[test]
    fn test_mix_and_mute() {
        let mut mixer = Mixer::new();
        for channel in &mut mixer.channels {
            channel.flags = MixerFlags::TONE_OFF | MixerFlags::NOISE_OFF;
            channel.volume = 15;
            channel.set_pan(0.0, false);
        }
        let (left, right) = mixer.mix([0; 3], 0, 0, &YM2149_DAC_TABLE);
        assert_relative_eq!(left, 3.0);
        assert_relative_eq!(right, 0.0);

        mixer.set_mute(1, true);
        assert!(mixer.is_muted(1));
        assert!(!mixer.is_muted(5));
        let (left, _) = mixer.mix([0; 3], 0, 0, &YM2149_DAC_TABLE);
        assert_relative_eq!(left, 2.0);

        mixer.reset();
        assert!(mixer.is_muted(1));
        assert_eq!(mixer.channels[0].volume, 0);
    }
}
