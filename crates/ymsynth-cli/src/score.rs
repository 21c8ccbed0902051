//! Timed event scores
//!
//! A score is a JSON array of `{ "time": seconds, "event": { "type": ... } }`
//! entries. Entries are kept sorted by time; events sharing a timestamp keep
//! their document order.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ymsynth_engine::Engine;

/// One host event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreEvent {
    /// Start a note
    NoteOn {
        #[serde(default)]
        channel: u8,
        pitch: u8,
        #[serde(default = "default_velocity")]
        velocity: u8,
    },
    /// Release a note
    NoteOff {
        #[serde(default)]
        channel: u8,
        pitch: u8,
    },
    /// Release everything
    AllNotesOff,
    /// 14-bit pitch wheel
    PitchWheel {
        #[serde(default)]
        channel: u8,
        value: u16,
    },
    /// MIDI control change
    Controller {
        #[serde(default)]
        channel: u8,
        controller: u8,
        value: u8,
    },
    /// Host tempo in BPM
    Tempo { bpm: f64 },
}

fn default_velocity() -> u8 {
    100
}

impl ScoreEvent {
    /// Forward the event to the engine
    pub fn apply(&self, engine: &mut Engine) {
        match *self {
            ScoreEvent::NoteOn {
                channel,
                pitch,
                velocity,
            } => engine.note_on(channel, pitch, velocity),
            ScoreEvent::NoteOff { channel, pitch } => engine.note_off(channel, pitch),
            ScoreEvent::AllNotesOff => engine.all_notes_off(),
            ScoreEvent::PitchWheel { channel, value } => engine.pitch_wheel(channel, value),
            ScoreEvent::Controller {
                channel,
                controller,
                value,
            } => engine.control_change(channel, controller, value),
            ScoreEvent::Tempo { bpm } => engine.set_tempo(bpm),
        }
    }
}

/// An event with its start time in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub time: f64,
    pub event: ScoreEvent,
}

/// Time-ordered list of events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    events: Vec<TimedEvent>,
}

impl Score {
    /// Build a score, rejecting negative or non-finite times
    pub fn new(mut events: Vec<TimedEvent>) -> Result<Self> {
        if let Some(bad) = events.iter().find(|e| !e.time.is_finite() || e.time < 0.0) {
            bail!("event time {} is not a non-negative number", bad.time);
        }
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { events })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let events: Vec<TimedEvent> =
            serde_json::from_str(json).context("score is not a JSON event list")?;
        Self::new(events)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read score {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("invalid score {}", path.display()))
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Time of the last event
    pub fn duration(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.time)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
