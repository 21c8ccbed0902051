//! Per-note modulation state machine
//!
//! A voice owns one chip channel for its lifetime. Once per output sample
//! [`Voice::update`] evaluates every modulation source in a fixed order
//! (pan, sequencer step, gates, noise, pitch, amplitude envelope, ring
//! modulation and buzzer phase, final level) and commits the result to the
//! chip. The order matters: later stages read values computed earlier in
//! the same tick.
//!
//! States are implicit: held (`note_on`), releasing (`!note_on` with a
//! non-zero envelope) and finished (`!note_on` with a zero envelope).

use ymsynth_chip::{ChipCore, ChipMode};

use crate::controls::HostControls;
use crate::envelope::{held_level, interpolate, pitch_envelope_offset, release_level, Glide};
use crate::lfo::{self, hash_unit};
use crate::patch::{Patch, MAX_LEVEL};
use crate::ringmod::RingModulator;
use crate::sequencer::{arpeggio_index, step_count, step_index, HeldPitches};
use crate::tuning;

/// Pitch the noise sensitivity is measured from
const MIDDLE_C: f64 = 60.0;

/// Ring modulation segments per tone period unit (32 entries over `2 * period` ticks)
const SEGMENTS_PER_PERIOD: f64 = 16.0;

const TONE_SALT: u64 = 0x746f_6e65;
const RING_SALT: u64 = 0x7269_6e67;
const BUZZER_SALT: u64 = 0x6275_7a7a;

/// Everything a voice reads while updating, borrowed from the engine
#[derive(Debug, Clone, Copy)]
pub struct VoiceContext<'a> {
    /// Active patch
    pub patch: &'a Patch,
    /// Held pitches, consumed by the arpeggiator
    pub held: &'a HeldPitches,
    /// Controller state
    pub controls: &'a HostControls,
    /// Chip variant for tuning
    pub mode: ChipMode,
    /// Master clock in Hz
    pub clock_rate: f64,
    /// Output sample rate in Hz
    pub sample_rate: f64,
}

/// Level gain for a note velocity
///
/// Maps velocity 1..=127 linearly onto `1 - sensitivity ..= 1`.
#[inline]
pub fn velocity_gain(velocity: u8, sensitivity: f64) -> f64 {
    let velocity = f64::from(velocity.clamp(1, 127));
    1.0 - sensitivity.clamp(0.0, 1.0) * (127.0 - velocity) / 126.0
}

#[inline]
fn gate_open(time: f64, elapsed: f64) -> bool {
    time < 0.0 || elapsed < time
}

#[inline]
fn blend(fixed_mix: f64, fixed: f64, relative: f64) -> f64 {
    fixed_mix * fixed + (1.0 - fixed_mix) * relative
}

fn random_phase(serial: u64, salt: u64) -> f64 {
    hash_unit(serial.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ salt)
}

/// One sounding note
#[derive(Debug, Clone)]
pub struct Voice {
    pitch: u8,
    velocity: u8,
    channel: usize,
    serial: u64,
    /// Base pitch before modulation (arpeggio selection in arp modes)
    note: f64,
    note_on: bool,
    first_tick: bool,

    on_samples: u64,
    release_samples: u64,
    release_start: f64,
    env_level: f64,
    level: f64,

    step_count: Option<u64>,
    step_index: i32,
    arp_index: Option<usize>,

    glide: Option<Glide>,
    glide_offset: f64,
    ring_mod: RingModulator,
    buzzer_shape: Option<u8>,
    previous_tone_bit: bool,

    tone_period: u16,
    noise_period: u8,
}

impl Voice {
    /// Create a held voice on a chip channel
    ///
    /// `serial` seeds the voice's random phases and arpeggio choices.
    pub fn new(pitch: u8, velocity: u8, channel: usize, serial: u64, glide: Option<Glide>) -> Self {
        let pitch = pitch.min(127);
        Self {
            pitch,
            velocity: velocity.clamp(1, 127),
            channel,
            serial,
            note: f64::from(pitch),
            note_on: true,
            first_tick: true,
            on_samples: 0,
            release_samples: 0,
            release_start: 0.0,
            env_level: 0.0,
            level: 0.0,
            step_count: None,
            step_index: -1,
            arp_index: None,
            glide_offset: glide.map_or(0.0, |g| g.from - g.to),
            glide,
            ring_mod: RingModulator::new(),
            buzzer_shape: None,
            previous_tone_bit: false,
            tone_period: 0,
            noise_period: 0,
        }
    }

    /// Start the release ramp from the current envelope level
    pub fn note_off(&mut self) {
        if self.note_on {
            self.note_on = false;
            self.release_start = self.env_level;
            self.release_samples = 0;
        }
    }

    /// Re-run the arpeggio selection on the next tick (held set changed)
    pub fn retarget(&mut self) {
        self.step_count = None;
    }

    /// Advance one sample and write the result to the chip
    ///
    /// Ring-mod and buzzer sync react to rising tone edges seen between
    /// consecutive calls. This is a per-sample approximation: a tone that
    /// toggles more than once per sample can hide an edge.
    pub fn update(&mut self, chip: &mut ChipCore, ctx: &VoiceContext<'_>) {
        let patch = ctx.patch;
        let channel = self.channel;
        let elapsed = self.on_samples as f64 / ctx.sample_rate;

        // Pan
        let pan = patch.pan.channels.get(channel).copied().unwrap_or(0.5);
        chip.set_pan(
            channel,
            (pan + ctx.controls.pan_offset()).clamp(0.0, 1.0),
            patch.pan.equal_power,
        );

        // Sequencer step and arpeggio selection
        let sequencer = &patch.sequencer;
        let count = step_count(
            self.on_samples,
            sequencer.step_frequency(patch.host.tempo),
            ctx.sample_rate,
        );
        if self.step_count != Some(count) {
            self.step_count = Some(count);
            self.step_index = step_index(count, sequencer.loop_start, sequencer.end);
            if patch.mode.is_arpeggio() && !ctx.held.is_empty() {
                let index = arpeggio_index(
                    patch.mode,
                    count,
                    ctx.held.len(),
                    usize::from(sequencer.arp_repeat),
                    self.arp_index,
                    self.serial,
                );
                self.arp_index = Some(index);
                if let Some(pitch) = ctx.held.get(index) {
                    self.note = f64::from(pitch);
                }
            }
        }
        let step = sequencer.step(self.step_index);
        let step_pitch = step.map_or(0.0, |s| s.pitch);
        let step_level = step.map_or(MAX_LEVEL, |s| s.level) / MAX_LEVEL;
        let step_noise = step.map_or(0.0, |s| s.noise);
        let step_depth = step.map_or(0.0, |s| s.depth);

        // Gates
        let tone_on = gate_open(patch.tone.time, elapsed);
        let noise_on = gate_open(patch.noise.time, elapsed);
        let buzzer_on = patch.buzzer.enabled && gate_open(patch.buzzer.time, elapsed);

        // Noise period
        let noise = &patch.noise;
        let base_noise = if elapsed < noise.attack_time {
            interpolate(elapsed, 0.0, noise.attack_time, noise.attack_period, noise.period)
        } else {
            noise.period
        };
        let noise_period = (base_noise
            + noise.pitch_sensitivity * (MIDDLE_C - self.note) / 12.0
            + step_noise)
            .round()
            .clamp(0.0, 31.0) as u8;

        // Pitch
        let spread = match channel {
            1 => -patch.tone.spread,
            2 => patch.tone.spread,
            _ => 0.0,
        };
        self.glide_offset = self
            .glide
            .map_or(0.0, |g| g.offset(elapsed, patch.portamento.smoothness));
        let vibrato = lfo::pitch_offset(
            &patch.lfo,
            patch.host.tempo,
            elapsed,
            ctx.controls.modulation_amount() * patch.control.modulation_depth,
        );
        let pitch = self.note
            + patch.tone.detune
            + spread
            + pitch_envelope_offset(&patch.pitch_envelope, elapsed)
            + self.glide_offset
            + vibrato
            + step_pitch
            + ctx.controls.bend(patch.control.pitchwheel);

        // Amplitude envelope; the hardware envelope shapes buzzer voices
        self.env_level = if buzzer_on {
            if self.note_on { MAX_LEVEL } else { 0.0 }
        } else if self.note_on {
            held_level(&patch.envelope, elapsed)
        } else {
            let released = self.release_samples as f64 / ctx.sample_rate;
            release_level(self.release_start, patch.envelope.release, released)
        };

        // Ring modulation and buzzer phase. The tone bit is sampled once per
        // output sample, so sync only sees edges of tones whose half cycle
        // is longer than one sample (period above ~6 at 2 MHz / 44.1 kHz).
        let tone_bit = chip.tone_bit(channel);
        let rising_edge = !self.first_tick && tone_bit && !self.previous_tone_bit;
        self.previous_tone_bit = tone_bit;

        let mut modulation = 1.0;
        let rm = &patch.ring_mod;
        if rm.enabled {
            let rm_pitch = blend(rm.fixed_mix, rm.pitch, pitch + rm.relative_pitch);
            let segment =
                f64::from(tuning::tone_period(ctx.mode, ctx.clock_rate, rm_pitch)) / SEGMENTS_PER_PERIOD;
            if self.first_tick {
                let phase = if rm.reset {
                    rm.phase
                } else {
                    random_phase(self.serial, RING_SALT)
                };
                self.ring_mod.reset_phase(phase, segment);
            } else {
                if rm.sync && rising_edge {
                    self.ring_mod.sync();
                }
                self.ring_mod
                    .advance(chip.ticks_per_sample(), segment, rm.loop_mode);
            }
            let depth = (rm.depth * velocity_gain(self.velocity, rm.velocity_sensitivity)
                + step_depth)
                .clamp(0.0, 1.0);
            modulation = self.ring_mod.level(&rm.waveform, depth);
        }

        let buzzer = &patch.buzzer;
        if buzzer_on {
            let buzzer_pitch = blend(buzzer.fixed_mix, buzzer.pitch, pitch + buzzer.relative_pitch);
            chip.set_envelope(tuning::envelope_period(ctx.mode, ctx.clock_rate, buzzer_pitch));
            match self.buzzer_shape {
                None => {
                    chip.set_envelope_shape(buzzer.shape);
                    let phase = if buzzer.reset {
                        buzzer.phase
                    } else {
                        random_phase(self.serial, BUZZER_SALT)
                    };
                    chip.set_envelope_phase(phase);
                }
                Some(shape) if shape != buzzer.shape => chip.set_envelope_shape(buzzer.shape),
                Some(_) => {
                    if buzzer.sync && rising_edge {
                        chip.restart_envelope();
                    }
                }
            }
            self.buzzer_shape = Some(buzzer.shape);
        }

        // Final level
        let velocity = velocity_gain(self.velocity, patch.control.velocity_sensitivity);
        self.level = (modulation * self.env_level * step_level * velocity * ctx.controls.gain())
            .clamp(0.0, MAX_LEVEL);

        // Commit
        self.tone_period = tuning::tone_period(ctx.mode, ctx.clock_rate, pitch);
        self.noise_period = noise_period;
        chip.set_tone(channel, self.tone_period);
        if noise_on {
            chip.set_noise(noise_period);
        }
        chip.set_mixer(channel, !tone_on, !noise_on, buzzer_on && self.env_level > 0.0);
        chip.set_volume(channel, self.level.round() as u8);

        if self.first_tick {
            let phase = if patch.tone.reset {
                patch.tone.phase
            } else {
                random_phase(self.serial, TONE_SALT)
            };
            chip.set_tone_phase(channel, phase);
            self.previous_tone_bit = chip.tone_bit(channel);
            self.first_tick = false;
        }

        self.on_samples += 1;
        if !self.note_on {
            self.release_samples += 1;
        }
    }

    /// Released and fully decayed
    #[inline]
    pub fn is_finished(&self) -> bool {
        !self.note_on && self.env_level <= 0.0
    }

    /// Base pitch including the glide still in progress
    pub fn current_pitch(&self) -> f64 {
        self.note + self.glide_offset
    }

    /// Note-on pitch
    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    /// Note-on velocity
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Chip channel owned by this voice
    pub fn channel(&self) -> usize {
        self.channel
    }

    /// Allocation serial number
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Base pitch before modulation
    pub fn note(&self) -> f64 {
        self.note
    }

    /// Key still held
    pub fn is_note_on(&self) -> bool {
        self.note_on
    }

    /// Amplitude envelope level (0-15)
    pub fn envelope_level(&self) -> f64 {
        self.env_level
    }

    /// Final level written to the chip (0-15)
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Samples since note-on
    pub fn elapsed_samples(&self) -> u64 {
        self.on_samples
    }

    /// Active sequencer step (-1 = none)
    pub fn step_index(&self) -> i32 {
        self.step_index
    }

    /// Last committed tone period
    pub fn tone_period(&self) -> u16 {
        self.tone_period
    }

    /// Last computed noise period
    pub fn noise_period(&self) -> u8 {
        self.noise_period
    }

    /// Ring modulation cursor
    pub fn ring_modulator(&self) -> &RingModulator {
        &self.ring_mod
    }
}
