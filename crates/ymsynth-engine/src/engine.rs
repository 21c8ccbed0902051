//! Polyphonic engine
//!
//! Owns the chip, the active voices and the controller state. Note events
//! allocate, steal and release voices according to the patch's play mode;
//! [`Engine::render`] advances every voice and the chip once per sample.
//!
//! Events must arrive between render calls. Buffer splitting at event
//! boundaries is the caller's job.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use ymsynth_chip::{ChipCore, ChipMode, NUM_CHANNELS};

use crate::controls::{cc, HostControls, PITCH_WHEEL_MAX};
use crate::envelope::Glide;
use crate::patch::{Patch, PlayMode, MAX_TEMPO, MIN_TEMPO};
use crate::sequencer::HeldPitches;
use crate::voice::{Voice, VoiceContext};
use crate::Result;

/// Inputs of the configure call plus the allocation seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chip variant
    pub chip_mode: ChipMode,
    /// Master clock in Hz
    pub clock_rate: f64,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Seed for polyphonic channel selection
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let chip_mode = ChipMode::default();
        Self {
            chip_mode,
            clock_rate: chip_mode.default_clock_rate(),
            sample_rate: ymsynth_chip::DEFAULT_SAMPLE_RATE,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Default configuration for a chip variant at its nominal clock
    pub fn for_chip(chip_mode: ChipMode) -> Self {
        Self {
            chip_mode,
            clock_rate: chip_mode.default_clock_rate(),
            ..Self::default()
        }
    }
}

/// Voice allocator and renderer
#[derive(Debug)]
pub struct Engine {
    chip: ChipCore,
    config: EngineConfig,
    patch: Patch,
    voices: Vec<Voice>,
    held: HeldPitches,
    /// Note-offs deferred by the sustain pedal
    sustained: HeldPitches,
    controls: HostControls,
    rng: Pcg32,
    next_serial: u64,
    last_pitch: Option<f64>,
}

impl Engine {
    /// Create an engine with a configured chip and the default patch
    pub fn new(config: EngineConfig) -> Result<Self> {
        let chip = ChipCore::with_config(config.chip_mode, config.clock_rate, config.sample_rate)?;
        info!(
            chip = %config.chip_mode,
            clock_rate = config.clock_rate,
            sample_rate = config.sample_rate,
            "engine created"
        );
        Ok(Self::with_chip(chip, config))
    }

    fn with_chip(chip: ChipCore, config: EngineConfig) -> Self {
        Self {
            chip,
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            patch: Patch::default(),
            voices: Vec::with_capacity(NUM_CHANNELS),
            held: HeldPitches::new(),
            sustained: HeldPitches::new(),
            controls: HostControls::default(),
            next_serial: 0,
            last_pitch: None,
        }
    }

    /// Select the chip variant and rates
    ///
    /// Resets the chip and silences every voice. Must not be called while a
    /// render is in progress.
    pub fn configure(&mut self, mode: ChipMode, clock_rate: f64, sample_rate: u32) -> Result<()> {
        self.chip.configure(mode, clock_rate, sample_rate)?;
        self.config.chip_mode = mode;
        self.config.clock_rate = clock_rate;
        self.config.sample_rate = sample_rate;
        self.voices.clear();
        self.held.clear();
        self.sustained.clear();
        info!(chip = %mode, clock_rate, sample_rate, "engine configured");
        Ok(())
    }

    /// Replace the patch; values are clamped into range first
    ///
    /// Switching into an arpeggio mode keeps only the newest voice, which
    /// then arpeggiates over every held pitch.
    pub fn set_patch(&mut self, mut patch: Patch) -> Result<()> {
        patch.sanitize()?;
        if patch.mode != self.patch.mode {
            debug!(from = ?self.patch.mode, to = ?patch.mode, "play mode changed");
            if patch.mode.is_arpeggio() && self.voices.len() > 1 {
                let newest = self.voices.len() - 1;
                let stolen: Vec<Voice> = self.voices.drain(..newest).collect();
                for voice in &stolen {
                    self.silence(voice);
                }
                for voice in &mut self.voices {
                    voice.retarget();
                }
            }
        }
        self.patch = patch;
        Ok(())
    }

    /// Current patch
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Update the host tempo in BPM
    pub fn set_tempo(&mut self, bpm: f64) {
        if bpm.is_finite() {
            self.patch.host.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
            trace!(tempo = self.patch.host.tempo, "tempo");
        }
    }

    /// Current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The emulated chip
    pub fn chip(&self) -> &ChipCore {
        &self.chip
    }

    /// Mute or unmute a chip channel
    pub fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        self.chip.set_channel_mute(channel, mute);
    }

    /// Active voices in allocation order
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Number of active voices
    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Pitches currently held down
    pub fn held_pitches(&self) -> &HeldPitches {
        &self.held
    }

    /// Controller state
    pub fn controls(&self) -> &HostControls {
        &self.controls
    }

    /// Start a note; velocity 0 is a note-off
    ///
    /// The MIDI channel is accepted for interface compatibility and ignored.
    pub fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(channel, pitch);
            return;
        }
        let pitch = pitch.min(127);
        let others_held = !self.held.is_empty();
        let glide_from = self
            .voices
            .last()
            .map(Voice::current_pitch)
            .or(self.last_pitch)
            .filter(|_| !self.patch.portamento.legato || others_held);
        self.held.insert(pitch);

        let mode = self.patch.mode;
        match mode {
            PlayMode::Mono => {
                self.steal_all();
                self.allocate(pitch, velocity, 0, glide_from);
            }
            PlayMode::Poly => {
                if self.voices.len() >= NUM_CHANNELS {
                    self.steal_quietest();
                }
                let chip_channel = self.free_channel();
                self.allocate(pitch, velocity, chip_channel, glide_from);
            }
            PlayMode::ArpUp | PlayMode::ArpDown | PlayMode::ArpRandom => {
                if self.held.len() == 1 || self.voices.is_empty() {
                    self.steal_all();
                    self.allocate(pitch, velocity, 0, glide_from);
                } else {
                    for voice in &mut self.voices {
                        voice.retarget();
                    }
                    debug!(pitch, held = self.held.len(), "arpeggio pitch added");
                }
            }
        }
    }

    /// Release a note
    ///
    /// While the sustain pedal is down the release is deferred until the
    /// pedal comes up.
    pub fn note_off(&mut self, _channel: u8, pitch: u8) {
        if self.controls.sustain && self.held.contains(pitch) {
            self.sustained.insert(pitch);
            trace!(pitch, "note-off deferred by sustain");
            return;
        }
        self.release_pitch(pitch);
    }

    /// Release every held note
    pub fn all_notes_off(&mut self) {
        self.held.clear();
        self.sustained.clear();
        for voice in &mut self.voices {
            voice.note_off();
        }
        debug!(voices = self.voices.len(), "all notes off");
    }

    /// Pitch wheel, 14-bit with centre 8192
    pub fn pitch_wheel(&mut self, _channel: u8, value: u16) {
        self.controls.pitch_wheel = value.min(PITCH_WHEEL_MAX);
        trace!(value = self.controls.pitch_wheel, "pitch wheel");
    }

    /// Modulation wheel (0-127)
    pub fn modulation(&mut self, _channel: u8, value: u8) {
        self.controls.modulation = value.min(127);
        trace!(value, "modulation");
    }

    /// Portamento time controller (0-127)
    pub fn portamento(&mut self, _channel: u8, value: u8) {
        self.controls.portamento = value.min(127);
        trace!(value, "portamento");
    }

    /// Channel volume (0-127)
    pub fn volume(&mut self, _channel: u8, value: u8) {
        self.controls.volume = value.min(127);
        trace!(value, "volume");
    }

    /// Pan (0-127, 64 = centre)
    pub fn pan(&mut self, _channel: u8, value: u8) {
        self.controls.pan = value.min(127);
        trace!(value, "pan");
    }

    /// Expression (0-127)
    pub fn expression(&mut self, _channel: u8, value: u8) {
        self.controls.expression = value.min(127);
        trace!(value, "expression");
    }

    /// Sustain pedal; values of 64 and above hold
    pub fn sustain_pedal(&mut self, _channel: u8, value: u8) {
        let down = value >= 64;
        trace!(down, "sustain pedal");
        if self.controls.sustain && !down {
            self.controls.sustain = false;
            while let Some(pitch) = self.sustained.pop() {
                self.release_pitch(pitch);
            }
        }
        self.controls.sustain = down;
    }

    /// Dispatch a MIDI control change by controller number
    pub fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        match controller {
            cc::MODULATION => self.modulation(channel, value),
            cc::PORTAMENTO_TIME => self.portamento(channel, value),
            cc::VOLUME => self.volume(channel, value),
            cc::PAN => self.pan(channel, value),
            cc::EXPRESSION => self.expression(channel, value),
            cc::SUSTAIN => self.sustain_pedal(channel, value),
            cc::ALL_SOUND_OFF | cc::ALL_NOTES_OFF => self.all_notes_off(),
            _ => trace!(controller, value, "ignoring controller"),
        }
    }

    /// Render into two output buffers
    ///
    /// Writes `min(left.len(), right.len())` samples; nothing is accumulated.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (sample_left, sample_right) = self.render_frame();
            *l = sample_left;
            *r = sample_right;
        }
    }

    /// Render one stereo sample
    ///
    /// With no active voice the chip is left untouched and silence is
    /// returned.
    pub fn render_frame(&mut self) -> (f32, f32) {
        if self.voices.is_empty() {
            return (0.0, 0.0);
        }

        let ctx = VoiceContext {
            patch: &self.patch,
            held: &self.held,
            controls: &self.controls,
            mode: self.config.chip_mode,
            clock_rate: self.config.clock_rate,
            sample_rate: f64::from(self.config.sample_rate),
        };
        for voice in &mut self.voices {
            voice.update(&mut self.chip, &ctx);
        }
        self.voices.retain(|voice| !voice.is_finished());

        if self.voices.is_empty() {
            return (0.0, 0.0);
        }
        let (left, right) = self.chip.process();
        (left as f32, right as f32)
    }

    fn release_pitch(&mut self, pitch: u8) {
        if !self.held.remove(pitch) {
            debug!(pitch, "ignoring note-off for pitch that is not held");
            return;
        }
        if self.patch.mode.is_arpeggio() {
            if self.held.is_empty() {
                for voice in &mut self.voices {
                    voice.note_off();
                }
            } else {
                for voice in &mut self.voices {
                    voice.retarget();
                }
            }
            return;
        }
        match self
            .voices
            .iter_mut()
            .find(|voice| voice.is_note_on() && voice.pitch() == pitch)
        {
            Some(voice) => voice.note_off(),
            None => debug!(pitch, "note-off for a voice that was already replaced"),
        }
    }

    fn allocate(&mut self, pitch: u8, velocity: u8, chip_channel: usize, glide_from: Option<f64>) {
        let duration = self.patch.portamento.time
            + self.controls.portamento_amount() * self.patch.control.portamento_time;
        let glide = glide_from.and_then(|from| Glide::new(from, f64::from(pitch), duration));

        let serial = self.next_serial;
        self.next_serial += 1;
        self.last_pitch = Some(f64::from(pitch));
        self.voices
            .push(Voice::new(pitch, velocity, chip_channel, serial, glide));
        debug!(
            pitch,
            velocity,
            chip_channel,
            serial,
            gliding = glide.is_some(),
            "voice allocated"
        );
    }

    fn steal_all(&mut self) {
        while let Some(voice) = self.voices.pop() {
            self.silence(&voice);
        }
    }

    fn steal_quietest(&mut self) {
        let mut quietest: Option<(usize, f64)> = None;
        for (index, voice) in self.voices.iter().enumerate() {
            let level = voice.envelope_level();
            if quietest.map_or(true, |(_, lowest)| level < lowest) {
                quietest = Some((index, level));
            }
        }
        if let Some((index, _)) = quietest {
            let voice = self.voices.remove(index);
            self.silence(&voice);
        }
    }

    fn silence(&mut self, voice: &Voice) {
        debug!(
            pitch = voice.pitch(),
            chip_channel = voice.channel(),
            level = voice.envelope_level(),
            "voice stolen"
        );
        self.chip.set_volume(voice.channel(), 0);
        self.chip.set_mixer(voice.channel(), true, true, false);
    }

    fn free_channel(&mut self) -> usize {
        let mut free = [0usize; NUM_CHANNELS];
        let mut count = 0;
        for channel in 0..NUM_CHANNELS {
            if self.voices.iter().all(|voice| voice.channel() != channel) {
                free[count] = channel;
                count += 1;
            }
        }
        if count == 0 {
            return 0;
        }
        free[self.rng.gen_range(0..count)]
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_chip(ChipCore::new(), EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(patch: Patch) -> Engine {
        let mut engine = Engine::default();
        engine.set_patch(patch).unwrap();
        engine
    }

    fn instant_patch(mode: PlayMode) -> Patch {
        let mut patch = Patch::default();
        patch.mode = mode;
        patch.envelope.release = 0.0;
        patch
    }

    fn render(engine: &mut Engine, samples: usize) {
        for _ in 0..samples {
            engine.render_frame();
        }
    }

    #[test]
    fn test_idle_engine_renders_silence() {
        let mut engine = Engine::default();
        let mut left = [1.0f32; 64];
        let mut right = [1.0f32; 64];
        engine.render(&mut left, &mut right);
        assert!(left.iter().chain(right.iter()).all(|s| *s == 0.0));
    }

    #[test]
    fn test_new_validates_config() {
        let config = EngineConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(Engine::new(config).is_err());
        assert!(Engine::new(EngineConfig::for_chip(ChipMode::Ay8910)).is_ok());
    }

    #[test]
    fn test_mono_steals_previous_voice() {
        let mut engine = engine_with(instant_patch(PlayMode::Mono));
        engine.note_on(0, 60, 100);
        engine.note_on(0, 64, 100);
        assert_eq!(engine.active_voice_count(), 1);
        assert_eq!(engine.voices()[0].pitch(), 64);
        assert_eq!(engine.voices()[0].channel(), 0);

        // Releasing the replaced pitch does not touch the new voice
        engine.note_off(0, 60);
        assert!(engine.voices()[0].is_note_on());
        engine.note_off(0, 64);
        assert!(!engine.voices()[0].is_note_on());
    }

    #[test]
    fn test_velocity_zero_is_note_off() {
        let mut engine = engine_with(instant_patch(PlayMode::Mono));
        engine.note_on(0, 60, 100);
        render(&mut engine, 10);
        engine.note_on(0, 60, 0);
        render(&mut engine, 1);
        assert_eq!(engine.active_voice_count(), 0);
        assert!(engine.held_pitches().is_empty());
    }

    #[test]
    fn test_unmatched_note_off_is_ignored() {
        let mut engine = engine_with(instant_patch(PlayMode::Poly));
        engine.note_on(0, 60, 100);
        engine.note_off(0, 72);
        assert_eq!(engine.active_voice_count(), 1);
        assert!(engine.voices()[0].is_note_on());
    }

    #[test]
    fn test_poly_uses_distinct_channels() {
        let mut engine = engine_with(instant_patch(PlayMode::Poly));
        for pitch in [60, 64, 67] {
            engine.note_on(0, pitch, 100);
        }
        let mut channels: Vec<usize> = engine.voices().iter().map(Voice::channel).collect();
        channels.sort_unstable();
        assert_eq!(channels, vec![0, 1, 2]);
    }

    #[test]
    fn test_poly_steals_quietest_voice() {
        let mut patch = instant_patch(PlayMode::Poly);
        patch.envelope.release = 1.0;
        let mut engine = engine_with(patch);
        engine.note_on(0, 60, 100);
        engine.note_on(0, 64, 100);
        engine.note_on(0, 67, 100);
        render(&mut engine, 10);
        engine.note_off(0, 64);
        render(&mut engine, 1_000);

        engine.note_on(0, 72, 100);
        assert_eq!(engine.active_voice_count(), 3);
        let pitches: Vec<u8> = engine.voices().iter().map(Voice::pitch).collect();
        assert_eq!(pitches, vec![60, 67, 72]);
    }

    #[test]
    fn test_poly_allocation_is_seeded() {
        let channels = |seed| {
            let mut engine = Engine::new(EngineConfig {
                seed,
                ..Default::default()
            })
            .unwrap();
            engine.set_patch(instant_patch(PlayMode::Poly)).unwrap();
            engine.note_on(0, 60, 100);
            engine.note_on(0, 62, 100);
            engine.voices().iter().map(Voice::channel).collect::<Vec<_>>()
        };
        assert_eq!(channels(3), channels(3));
    }

    #[test]
    fn test_sustain_pedal_defers_release() {
        let mut engine = engine_with(instant_patch(PlayMode::Mono));
        engine.note_on(0, 60, 100);
        engine.control_change(0, cc::SUSTAIN, 127);
        engine.note_off(0, 60);
        render(&mut engine, 10);
        assert_eq!(engine.active_voice_count(), 1);
        assert!(engine.voices()[0].is_note_on());

        engine.control_change(0, cc::SUSTAIN, 0);
        render(&mut engine, 1);
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[test]
    fn test_arpeggio_keeps_single_voice() {
        let mut engine = engine_with(instant_patch(PlayMode::ArpUp));
        for pitch in [60, 64, 67] {
            engine.note_on(0, pitch, 100);
        }
        assert_eq!(engine.active_voice_count(), 1);
        assert_eq!(engine.held_pitches().as_slice(), &[60, 64, 67]);

        engine.note_off(0, 60);
        engine.note_off(0, 64);
        assert!(engine.voices()[0].is_note_on());
        engine.note_off(0, 67);
        assert!(!engine.voices()[0].is_note_on());
    }

    #[test]
    fn test_switch_to_arpeggio_keeps_one_voice() {
        let mut engine = engine_with(instant_patch(PlayMode::Poly));
        engine.note_on(0, 60, 100);
        engine.note_on(0, 64, 100);
        render(&mut engine, 10);
        assert_eq!(engine.active_voice_count(), 2);

        engine.set_patch(instant_patch(PlayMode::ArpUp)).unwrap();
        assert_eq!(engine.active_voice_count(), 1);
        assert_eq!(engine.voices()[0].pitch(), 64);

        engine.note_on(0, 67, 100);
        render(&mut engine, 10);
        assert_eq!(engine.active_voice_count(), 1);
        assert_eq!(engine.held_pitches().as_slice(), &[60, 64, 67]);
    }

    #[test]
    fn test_all_notes_off_releases_everything() {
        let mut engine = engine_with(instant_patch(PlayMode::Poly));
        engine.note_on(0, 60, 100);
        engine.note_on(0, 67, 100);
        engine.control_change(0, cc::ALL_NOTES_OFF, 0);
        assert!(engine.held_pitches().is_empty());
        assert!(engine.voices().iter().all(|v| !v.is_note_on()));
        render(&mut engine, 1);
        assert_eq!(engine.active_voice_count(), 0);
    }

    #[test]
    fn test_controllers_are_recorded() {
        let mut engine = Engine::default();
        engine.control_change(0, cc::MODULATION, 99);
        engine.control_change(0, cc::VOLUME, 200);
        engine.control_change(0, 74, 10);
        engine.pitch_wheel(0, 20_000);
        assert_eq!(engine.controls().modulation, 99);
        assert_eq!(engine.controls().volume, 127);
        assert_eq!(engine.controls().pitch_wheel, PITCH_WHEEL_MAX);
    }

    #[test]
    fn test_pitch_wheel_bends_tone() {
        let mut engine = engine_with(instant_patch(PlayMode::Mono));
        engine.note_on(0, 60, 100);
        render(&mut engine, 1);
        assert_eq!(engine.chip().tone_period(0), 478);
        engine.pitch_wheel(0, 0);
        render(&mut engine, 1);
        // Two semitones down
        assert_eq!(engine.chip().tone_period(0), 536);
    }

    #[test]
    fn test_portamento_glides_between_notes() {
        let mut patch = instant_patch(PlayMode::Mono);
        patch.portamento.time = 0.05;
        let mut engine = engine_with(patch);
        engine.note_on(0, 48, 100);
        render(&mut engine, 100);
        engine.note_on(0, 60, 100);
        render(&mut engine, 1);
        assert_eq!(engine.chip().tone_period(0), 956);
        render(&mut engine, 3_000);
        assert_eq!(engine.chip().tone_period(0), 478);
    }

    #[test]
    fn test_legato_glides_only_over_held_notes() {
        let mut patch = instant_patch(PlayMode::Mono);
        patch.portamento.time = 0.05;
        patch.portamento.legato = true;
        let mut engine = engine_with(patch);
        engine.note_on(0, 48, 100);
        engine.note_off(0, 48);
        render(&mut engine, 10);
        engine.note_on(0, 60, 100);
        render(&mut engine, 1);
        assert_eq!(engine.chip().tone_period(0), 478);
    }

    #[test]
    fn test_set_tempo_clamps() {
        let mut engine = Engine::default();
        engine.set_tempo(5_000.0);
        assert_eq!(engine.patch().host.tempo, MAX_TEMPO);
        engine.set_tempo(f64::NAN);
        assert_eq!(engine.patch().host.tempo, MAX_TEMPO);
    }

    #[test]
    fn test_configure_resets_voices() {
        let mut engine = Engine::default();
        engine.note_on(0, 60, 100);
        engine
            .configure(ChipMode::Ay8910, 1_773_400.0, 48_000)
            .unwrap();
        assert_eq!(engine.active_voice_count(), 0);
        assert_eq!(engine.chip().mode(), ChipMode::Ay8910);
        assert!(engine.configure(ChipMode::Ym2149, -1.0, 48_000).is_err());
    }
}
