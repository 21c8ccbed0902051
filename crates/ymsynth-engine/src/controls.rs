//! Host controller state
//!
//! Raw 7-bit controller values and the 14-bit pitch wheel as last received,
//! with the mappings onto continuous modulation amounts.

/// Pitch wheel centre position
pub const PITCH_WHEEL_CENTER: u16 = 8192;

/// Largest 14-bit pitch wheel value
pub const PITCH_WHEEL_MAX: u16 = 16383;

/// Largest 7-bit controller value
pub const CONTROLLER_MAX: u8 = 127;

/// MIDI controller numbers understood by the engine
pub mod cc {
    /// Modulation wheel
    pub const MODULATION: u8 = 1;
    /// Portamento time
    pub const PORTAMENTO_TIME: u8 = 5;
    /// Channel volume
    pub const VOLUME: u8 = 7;
    /// Pan
    pub const PAN: u8 = 10;
    /// Expression
    pub const EXPRESSION: u8 = 11;
    /// Sustain pedal
    pub const SUSTAIN: u8 = 64;
    /// All sound off
    pub const ALL_SOUND_OFF: u8 = 120;
    /// All notes off
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// Last received controller values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostControls {
    /// Pitch wheel (0-16383, centre 8192)
    pub pitch_wheel: u16,
    /// Modulation wheel
    pub modulation: u8,
    /// Portamento time
    pub portamento: u8,
    /// Channel volume
    pub volume: u8,
    /// Pan (64 = centre)
    pub pan: u8,
    /// Expression
    pub expression: u8,
    /// Sustain pedal down
    pub sustain: bool,
}

impl Default for HostControls {
    fn default() -> Self {
        Self {
            pitch_wheel: PITCH_WHEEL_CENTER,
            modulation: 0,
            portamento: 0,
            volume: CONTROLLER_MAX,
            pan: 64,
            expression: CONTROLLER_MAX,
            sustain: false,
        }
    }
}

fn unit(value: u8) -> f64 {
    f64::from(value.min(CONTROLLER_MAX)) / f64::from(CONTROLLER_MAX)
}

impl HostControls {
    /// Pitch bend in semitones for a wheel range of `range` semitones
    #[inline]
    pub fn bend(&self, range: f64) -> f64 {
        let offset = f64::from(self.pitch_wheel.min(PITCH_WHEEL_MAX)) - f64::from(PITCH_WHEEL_CENTER);
        offset / f64::from(PITCH_WHEEL_CENTER) * range
    }

    /// Modulation wheel position (0-1)
    #[inline]
    pub fn modulation_amount(&self) -> f64 {
        unit(self.modulation)
    }

    /// Portamento controller position (0-1)
    #[inline]
    pub fn portamento_amount(&self) -> f64 {
        unit(self.portamento)
    }

    /// Combined volume and expression gain (0-1)
    #[inline]
    pub fn gain(&self) -> f64 {
        unit(self.volume) * unit(self.expression)
    }

    /// Pan offset added to every channel (-1..1)
    #[inline]
    pub fn pan_offset(&self) -> f64 {
        ((f64::from(self.pan.min(CONTROLLER_MAX)) - 64.0) / 64.0).clamp(-1.0, 1.0)
    }
}
