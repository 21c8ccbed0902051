//! Patch data model
//!
//! A patch is the complete set of synthesis parameters read by every voice.
//! Times are in seconds, pitches in semitones and levels in
//! `0..=MAX_LEVEL`. All records deserialize with defaults, so a partial JSON
//! document yields a complete, playable patch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, SynthError};

/// Highest amplitude level (matches the chip's 4-bit volume)
pub const MAX_LEVEL: f64 = 15.0;

/// Number of entries in the ring modulation waveform table
pub const WAVEFORM_SIZE: usize = 32;

/// Number of steps in the step sequencer
pub const SEQUENCER_STEPS: usize = 16;

/// Voice allocation and arpeggiation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// One voice; each note steals the previous one
    #[default]
    Mono,
    /// Up to one voice per chip channel
    Poly,
    /// Single voice cycling held pitches in ascending order
    ArpUp,
    /// Single voice cycling held pitches in descending order
    ArpDown,
    /// Single voice picking held pitches at random
    ArpRandom,
}

impl PlayMode {
    /// True for the arpeggiator modes
    pub fn is_arpeggio(self) -> bool {
        matches!(self, PlayMode::ArpUp | PlayMode::ArpDown | PlayMode::ArpRandom)
    }
}

/// Ring modulation waveform loop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play the table once and freeze on the last entry
    Off,
    /// Wrap from the last entry back to the first
    #[default]
    Forward,
    /// Reverse direction at either end
    PingPong,
}

/// LFO waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfoWaveform {
    /// Sine
    #[default]
    Sine,
    /// Triangle
    Triangle,
    /// Falling sawtooth
    SawDown,
    /// Rising sawtooth
    SawUp,
    /// Square
    Square,
    /// Random value held for each half cycle
    Random,
}

/// Square tone settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParams {
    /// Seconds the tone stays enabled after note-on (negative = always)
    pub time: f64,
    /// Static pitch offset in semitones
    pub detune: f64,
    /// Channel spread in semitones (channel 1 = -spread, channel 2 = +spread)
    pub spread: f64,
    /// Start phase of the square (0..1)
    pub phase: f64,
    /// Restart at `phase` on note-on instead of a random phase
    pub reset: bool,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            time: -1.0,
            detune: 0.0,
            spread: 0.0,
            phase: 0.0,
            reset: true,
        }
    }
}

/// Noise settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseParams {
    /// Seconds the noise stays enabled after note-on (negative = always)
    pub time: f64,
    /// Final noise period (0-31)
    pub period: f64,
    /// Noise period at note-on (0-31)
    pub attack_period: f64,
    /// Seconds to glide from `attack_period` to `period`
    pub attack_time: f64,
    /// Period change per octave below middle C
    pub pitch_sensitivity: f64,
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            period: 1.0,
            attack_period: 1.0,
            attack_time: 0.0,
            pitch_sensitivity: 0.0,
        }
    }
}

/// Amplitude envelope
///
/// Attack ramps from silence to `hold1`, then `inter1`, `inter2` and `decay`
/// ramp through `hold2`, `hold3` and `sustain`. Release ramps to silence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    /// Attack time
    pub attack: f64,
    /// Level reached at the end of the attack
    pub hold1: f64,
    /// Time from `hold1` to `hold2`
    pub inter1: f64,
    /// Second hold level
    pub hold2: f64,
    /// Time from `hold2` to `hold3`
    pub inter2: f64,
    /// Third hold level
    pub hold3: f64,
    /// Time from `hold3` to `sustain`
    pub decay: f64,
    /// Sustain level
    pub sustain: f64,
    /// Release time
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.0,
            hold1: MAX_LEVEL,
            inter1: 0.0,
            hold2: MAX_LEVEL,
            inter2: 0.0,
            hold3: MAX_LEVEL,
            decay: 0.0,
            sustain: MAX_LEVEL,
            release: 0.1,
        }
    }
}

/// Pitch envelope: a linear sweep from `pitch` to zero
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchEnvelopeParams {
    /// Initial offset in semitones
    pub pitch: f64,
    /// Sweep time
    pub time: f64,
}

/// Amplitude ring modulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingModParams {
    /// Enable ring modulation
    pub enabled: bool,
    /// Amplitude table, levels 0..=MAX_LEVEL
    pub waveform: [f64; WAVEFORM_SIZE],
    /// Loop policy for the table
    pub loop_mode: LoopMode,
    /// Fixed modulator pitch
    pub pitch: f64,
    /// Modulator pitch relative to the voice pitch
    pub relative_pitch: f64,
    /// Blend between relative (0) and fixed (1) pitch
    pub fixed_mix: f64,
    /// Modulation depth (0-1)
    pub depth: f64,
    /// How much low velocities reduce the depth (0-1)
    pub velocity_sensitivity: f64,
    /// Restart the table on each rising tone edge
    pub sync: bool,
    /// Start phase of the table (0..1)
    pub phase: f64,
    /// Restart at `phase` on note-on instead of a random phase
    pub reset: bool,
}

impl Default for RingModParams {
    fn default() -> Self {
        Self {
            enabled: false,
            waveform: [MAX_LEVEL; WAVEFORM_SIZE],
            loop_mode: LoopMode::Forward,
            pitch: 60.0,
            relative_pitch: 0.0,
            fixed_mix: 0.0,
            depth: 1.0,
            velocity_sensitivity: 0.0,
            sync: false,
            phase: 0.0,
            reset: true,
        }
    }
}

/// Hardware envelope ("buzzer") mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuzzerParams {
    /// Drive the channel from the chip envelope generator
    pub enabled: bool,
    /// Seconds the buzzer stays enabled after note-on (negative = always)
    pub time: f64,
    /// Envelope shape code (0-15)
    pub shape: u8,
    /// Fixed buzzer pitch
    pub pitch: f64,
    /// Buzzer pitch relative to the voice pitch
    pub relative_pitch: f64,
    /// Blend between relative (0) and fixed (1) pitch
    pub fixed_mix: f64,
    /// Restart the envelope on each rising tone edge
    pub sync: bool,
    /// Start phase of the envelope (0..1)
    pub phase: f64,
    /// Restart at `phase` on note-on instead of a random phase
    pub reset: bool,
}

impl Default for BuzzerParams {
    fn default() -> Self {
        Self {
            enabled: false,
            time: -1.0,
            shape: 8,
            pitch: 60.0,
            relative_pitch: 0.0,
            fixed_mix: 0.0,
            sync: false,
            phase: 0.0,
            reset: true,
        }
    }
}

/// One step of the step sequencer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerStep {
    /// Pitch offset in semitones
    pub pitch: f64,
    /// Level multiplier, 0..=MAX_LEVEL
    pub level: f64,
    /// Noise period offset
    pub noise: f64,
    /// Ring modulation depth offset
    pub depth: f64,
}

impl Default for SequencerStep {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            level: MAX_LEVEL,
            noise: 0.0,
            depth: 0.0,
        }
    }
}

/// Step sequencer and arpeggiator clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerParams {
    /// Steps per second when not tempo synced
    pub frequency: f64,
    /// Derive the step rate from the host tempo
    pub tempo_sync: bool,
    /// Steps per beat when tempo synced
    pub steps_per_beat: f64,
    /// First step of the loop (negative = no loop)
    pub loop_start: i32,
    /// One past the last step (0 disables the step sequencer)
    pub end: i32,
    /// Held-pitch position arpeggios return to after their first pass
    pub arp_repeat: u8,
    /// Step table
    pub steps: [SequencerStep; SEQUENCER_STEPS],
}

impl Default for SequencerParams {
    fn default() -> Self {
        Self {
            frequency: 8.0,
            tempo_sync: false,
            steps_per_beat: 4.0,
            loop_start: 0,
            end: 0,
            arp_repeat: 0,
            steps: Default::default(),
        }
    }
}

impl SequencerParams {
    /// Step rate in Hz at the given host tempo
    pub fn step_frequency(&self, tempo: f64) -> f64 {
        if self.tempo_sync {
            tempo / 60.0 * self.steps_per_beat
        } else {
            self.frequency
        }
    }

    /// Step record for an active index (negative = none)
    pub fn step(&self, index: i32) -> Option<&SequencerStep> {
        usize::try_from(index).ok().and_then(|i| self.steps.get(i))
    }
}

/// Pitch LFO
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoParams {
    /// Waveform
    pub waveform: LfoWaveform,
    /// Rate in Hz when not tempo synced
    pub frequency: f64,
    /// Derive the rate from the host tempo
    pub tempo_sync: bool,
    /// Cycles per beat when tempo synced
    pub cycles_per_beat: f64,
    /// Fade-in time
    pub delay: f64,
    /// Depth in semitones
    pub depth: f64,
    /// Start phase (0..1)
    pub phase: f64,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            waveform: LfoWaveform::Sine,
            frequency: 5.0,
            tempo_sync: false,
            cycles_per_beat: 1.0,
            delay: 0.0,
            depth: 0.0,
            phase: 0.0,
        }
    }
}

impl LfoParams {
    /// LFO rate in Hz at the given host tempo
    pub fn rate(&self, tempo: f64) -> f64 {
        if self.tempo_sync {
            tempo / 60.0 * self.cycles_per_beat
        } else {
            self.frequency
        }
    }
}

/// Portamento glide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortamentoParams {
    /// Glide time
    pub time: f64,
    /// Curve shape: 0 = almost linear, 1 = steep S-curve
    pub smoothness: f64,
    /// Glide only between overlapping notes
    pub legato: bool,
}

impl Default for PortamentoParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            smoothness: 0.5,
            legato: false,
        }
    }
}

/// Stereo placement of the chip channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanParams {
    /// Pan per channel (0 = left, 1 = right)
    pub channels: [f64; 3],
    /// Use the equal-power pan law
    pub equal_power: bool,
}

impl Default for PanParams {
    fn default() -> Self {
        Self {
            channels: [0.5; 3],
            equal_power: false,
        }
    }
}

/// Controller ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    /// Pitch wheel range in semitones
    pub pitchwheel: f64,
    /// LFO depth in semitones added at full modulation wheel
    pub modulation_depth: f64,
    /// Glide time added at full portamento controller
    pub portamento_time: f64,
    /// How much low velocities reduce the level (0-1)
    pub velocity_sensitivity: f64,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            pitchwheel: 2.0,
            modulation_depth: 0.5,
            portamento_time: 0.5,
            velocity_sensitivity: 0.0,
        }
    }
}

/// Values supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostParams {
    /// Tempo in BPM
    pub tempo: f64,
}

impl Default for HostParams {
    fn default() -> Self {
        Self { tempo: 120.0 }
    }
}

/// Complete synthesis patch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Patch {
    /// Voice allocation policy
    pub mode: PlayMode,
    /// Square tone
    pub tone: ToneParams,
    /// Noise
    pub noise: NoiseParams,
    /// Amplitude envelope
    pub envelope: EnvelopeParams,
    /// Pitch envelope
    pub pitch_envelope: PitchEnvelopeParams,
    /// Ring modulation
    pub ring_mod: RingModParams,
    /// Hardware envelope mode
    pub buzzer: BuzzerParams,
    /// Step sequencer
    pub sequencer: SequencerParams,
    /// Pitch LFO
    pub lfo: LfoParams,
    /// Portamento
    pub portamento: PortamentoParams,
    /// Stereo placement
    pub pan: PanParams,
    /// Controller ranges
    pub control: ControlParams,
    /// Host values
    pub host: HostParams,
}

impl Patch {
    /// Decode a JSON patch and clamp it into range
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut patch: Patch = serde_json::from_str(json)?;
        patch.sanitize()?;
        Ok(patch)
    }

    /// Load a JSON patch from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Encode as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp every field into its domain
    ///
    /// Out-of-range values are clamped with a warning; non-finite values are
    /// rejected since there is no meaningful value to clamp them to.
    pub fn sanitize(&mut self) -> Result<()> {
        let tone = &mut self.tone;
        finite("tone.time", tone.time)?;
        clamp("tone.detune", &mut tone.detune, -48.0, 48.0)?;
        clamp("tone.spread", &mut tone.spread, -24.0, 24.0)?;
        clamp("tone.phase", &mut tone.phase, 0.0, 1.0)?;

        let noise = &mut self.noise;
        finite("noise.time", noise.time)?;
        clamp("noise.period", &mut noise.period, 0.0, 31.0)?;
        clamp("noise.attack_period", &mut noise.attack_period, 0.0, 31.0)?;
        clamp("noise.attack_time", &mut noise.attack_time, 0.0, MAX_TIME)?;
        clamp("noise.pitch_sensitivity", &mut noise.pitch_sensitivity, -31.0, 31.0)?;

        let env = &mut self.envelope;
        for (name, time) in [
            ("envelope.attack", &mut env.attack),
            ("envelope.inter1", &mut env.inter1),
            ("envelope.inter2", &mut env.inter2),
            ("envelope.decay", &mut env.decay),
            ("envelope.release", &mut env.release),
        ] {
            clamp(name, time, 0.0, MAX_TIME)?;
        }
        for (name, level) in [
            ("envelope.hold1", &mut env.hold1),
            ("envelope.hold2", &mut env.hold2),
            ("envelope.hold3", &mut env.hold3),
            ("envelope.sustain", &mut env.sustain),
        ] {
            clamp(name, level, 0.0, MAX_LEVEL)?;
        }

        clamp("pitch_envelope.pitch", &mut self.pitch_envelope.pitch, -96.0, 96.0)?;
        clamp("pitch_envelope.time", &mut self.pitch_envelope.time, 0.0, MAX_TIME)?;

        let rm = &mut self.ring_mod;
        for level in rm.waveform.iter_mut() {
            clamp("ring_mod.waveform", level, 0.0, MAX_LEVEL)?;
        }
        clamp("ring_mod.pitch", &mut rm.pitch, 0.0, 127.0)?;
        clamp("ring_mod.relative_pitch", &mut rm.relative_pitch, -96.0, 96.0)?;
        clamp("ring_mod.fixed_mix", &mut rm.fixed_mix, 0.0, 1.0)?;
        clamp("ring_mod.depth", &mut rm.depth, 0.0, 1.0)?;
        clamp("ring_mod.velocity_sensitivity", &mut rm.velocity_sensitivity, 0.0, 1.0)?;
        clamp("ring_mod.phase", &mut rm.phase, 0.0, 1.0)?;

        let buzzer = &mut self.buzzer;
        finite("buzzer.time", buzzer.time)?;
        if buzzer.shape > 0x0F {
            warn!(field = "buzzer.shape", value = buzzer.shape, "masking envelope shape");
            buzzer.shape &= 0x0F;
        }
        clamp("buzzer.pitch", &mut buzzer.pitch, 0.0, 127.0)?;
        clamp("buzzer.relative_pitch", &mut buzzer.relative_pitch, -96.0, 96.0)?;
        clamp("buzzer.fixed_mix", &mut buzzer.fixed_mix, 0.0, 1.0)?;
        clamp("buzzer.phase", &mut buzzer.phase, 0.0, 1.0)?;

        let seq = &mut self.sequencer;
        clamp("sequencer.frequency", &mut seq.frequency, 0.0, MAX_RATE)?;
        clamp("sequencer.steps_per_beat", &mut seq.steps_per_beat, 0.0, 64.0)?;
        let steps = SEQUENCER_STEPS as i32;
        if !(0..=steps).contains(&seq.end) {
            warn!(field = "sequencer.end", value = seq.end, "clamping");
            seq.end = seq.end.clamp(0, steps);
        }
        if !(-1..steps).contains(&seq.loop_start) {
            warn!(field = "sequencer.loop_start", value = seq.loop_start, "clamping");
            seq.loop_start = seq.loop_start.clamp(-1, steps - 1);
        }
        for step in seq.steps.iter_mut() {
            clamp("sequencer.steps.pitch", &mut step.pitch, -96.0, 96.0)?;
            clamp("sequencer.steps.level", &mut step.level, 0.0, MAX_LEVEL)?;
            clamp("sequencer.steps.noise", &mut step.noise, -31.0, 31.0)?;
            clamp("sequencer.steps.depth", &mut step.depth, -1.0, 1.0)?;
        }

        let lfo = &mut self.lfo;
        clamp("lfo.frequency", &mut lfo.frequency, 0.0, MAX_RATE)?;
        clamp("lfo.cycles_per_beat", &mut lfo.cycles_per_beat, 0.0, 64.0)?;
        clamp("lfo.delay", &mut lfo.delay, 0.0, MAX_TIME)?;
        clamp("lfo.depth", &mut lfo.depth, 0.0, 96.0)?;
        clamp("lfo.phase", &mut lfo.phase, 0.0, 1.0)?;

        clamp("portamento.time", &mut self.portamento.time, 0.0, MAX_TIME)?;
        clamp("portamento.smoothness", &mut self.portamento.smoothness, 0.0, 1.0)?;

        for pan in self.pan.channels.iter_mut() {
            clamp("pan.channels", pan, 0.0, 1.0)?;
        }

        let control = &mut self.control;
        clamp("control.pitchwheel", &mut control.pitchwheel, 0.0, 48.0)?;
        clamp("control.modulation_depth", &mut control.modulation_depth, 0.0, 96.0)?;
        clamp("control.portamento_time", &mut control.portamento_time, 0.0, MAX_TIME)?;
        clamp("control.velocity_sensitivity", &mut control.velocity_sensitivity, 0.0, 1.0)?;

        clamp("host.tempo", &mut self.host.tempo, MIN_TEMPO, MAX_TEMPO)?;
        Ok(())
    }
}

/// Longest accepted time value in seconds
const MAX_TIME: f64 = 60.0;

/// Fastest accepted LFO or sequencer rate in Hz
const MAX_RATE: f64 = 1000.0;

/// Accepted host tempo range in BPM
pub const MIN_TEMPO: f64 = 1.0;
/// Upper bound of the accepted host tempo
pub const MAX_TEMPO: f64 = 999.0;

fn finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SynthError::InvalidPatch(format!("{name} is not finite ({value})")))
    }
}

fn clamp(name: &str, value: &mut f64, min: f64, max: f64) -> Result<()> {
    finite(name, *value)?;
    if *value < min || *value > max {
        let clamped = value.clamp(min, max);
        warn!(field = name, value = *value, clamped, "patch value out of range");
        *value = clamped;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_is_sane() {
        let mut patch = Patch::default();
        let before = patch.clone();
        patch.sanitize().unwrap();
        assert_eq!(patch, before);
        assert_eq!(patch.mode, PlayMode::Mono);
        assert!(patch.tone.time < 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let patch = Patch::from_json_str(
            r#"{ "mode": "arp_up", "envelope": { "release": 0.5 }, "lfo": { "waveform": "saw_down" } }"#,
        )
        .unwrap();
        assert_eq!(patch.mode, PlayMode::ArpUp);
        assert_eq!(patch.envelope.release, 0.5);
        assert_eq!(patch.envelope.sustain, MAX_LEVEL);
        assert_eq!(patch.lfo.waveform, LfoWaveform::SawDown);
        assert_eq!(patch.ring_mod.loop_mode, LoopMode::Forward);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let patch = Patch::from_json_str(
            r#"{ "noise": { "period": 99 }, "envelope": { "sustain": 40, "attack": -1 },
                 "sequencer": { "end": 99, "loop_start": -7 }, "buzzer": { "shape": 29 } }"#,
        )
        .unwrap();
        assert_eq!(patch.noise.period, 31.0);
        assert_eq!(patch.envelope.sustain, MAX_LEVEL);
        assert_eq!(patch.envelope.attack, 0.0);
        assert_eq!(patch.sequencer.end, 16);
        assert_eq!(patch.sequencer.loop_start, -1);
        assert_eq!(patch.buzzer.shape, 13);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut patch = Patch::default();
        patch.lfo.depth = f64::NAN;
        assert!(matches!(patch.sanitize(), Err(SynthError::InvalidPatch(_))));

        let mut patch = Patch::default();
        patch.tone.time = f64::INFINITY;
        assert!(patch.sanitize().is_err());
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        assert!(matches!(
            Patch::from_json_str("{ mode: "),
            Err(SynthError::Decode(_))
        ));
    }

    #[test]
    fn test_json_round_trip_preserves_patch() {
        let mut patch = Patch::default();
        patch.mode = PlayMode::ArpRandom;
        patch.ring_mod.loop_mode = LoopMode::PingPong;
        patch.sequencer.steps[3].pitch = 7.0;
        let json = patch.to_json_string().unwrap();
        assert!(json.contains("\"ping_pong\""));
        assert_eq!(Patch::from_json_str(&json).unwrap(), patch);
    }

    #[test]
    fn test_rates_follow_tempo_sync() {
        let mut seq = SequencerParams::default();
        assert_eq!(seq.step_frequency(120.0), 8.0);
        seq.tempo_sync = true;
        seq.steps_per_beat = 4.0;
        assert_eq!(seq.step_frequency(120.0), 8.0);
        assert_eq!(seq.step_frequency(60.0), 4.0);

        let mut lfo = LfoParams::default();
        lfo.tempo_sync = true;
        lfo.cycles_per_beat = 0.5;
        assert_eq!(lfo.rate(120.0), 1.0);
    }

    #[test]
    fn test_sequencer_step_lookup() {
        let seq = SequencerParams::default();
        assert!(seq.step(-1).is_none());
        assert!(seq.step(16).is_none());
        assert_eq!(seq.step(0).map(|s| s.level), Some(MAX_LEVEL));
    }

    #[test]
    fn test_play_mode_classification() {
        assert!(!PlayMode::Mono.is_arpeggio());
        assert!(!PlayMode::Poly.is_arpeggio());
        assert!(PlayMode::ArpUp.is_arpeggio());
        assert!(PlayMode::ArpDown.is_arpeggio());
        assert!(PlayMode::ArpRandom.is_arpeggio());
    }
}
