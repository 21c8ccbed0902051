//! Offline rendering of a score into a stereo buffer and WAV export

use crate::score::Score;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use ymsynth_engine::Engine;

/// Rendered stereo audio
#[derive(Debug, Clone, Default)]
pub struct StereoBuffer {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoBuffer {
    fn silent(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    pub fn frames(&self) -> usize {
        self.left.len()
    }

    /// Largest absolute sample over both channels
    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(&self.right)
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Samples in L/R interleaved order
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames() * 2);
        for (l, r) in self.left.iter().zip(&self.right) {
            out.push(*l);
            out.push(*r);
        }
        out
    }
}

fn frame_at(time: f64, sample_rate: u32) -> usize {
    (time * f64::from(sample_rate)).round().max(0.0) as usize
}

/// Play `score` through `engine`, then `tail` more seconds
///
/// Events land on the nearest sample boundary; the buffer between two events
/// is rendered in one call.
pub fn render_score(engine: &mut Engine, score: &Score, tail: f64) -> StereoBuffer {
    let sample_rate = engine.config().sample_rate;
    let tail_frames = frame_at(tail.max(0.0), sample_rate);
    let total = frame_at(score.duration(), sample_rate) + tail_frames;
    let mut buffer = StereoBuffer::silent(total);

    let mut cursor = 0;
    for timed in score.events() {
        let frame = frame_at(timed.time, sample_rate).min(total);
        if frame > cursor {
            engine.render(&mut buffer.left[cursor..frame], &mut buffer.right[cursor..frame]);
            cursor = frame;
        }
        debug!(frame, event = ?timed.event, "score event");
        timed.event.apply(engine);
    }
    engine.render(&mut buffer.left[cursor..], &mut buffer.right[cursor..]);
    buffer
}

/// Write a 16-bit stereo WAV file
pub fn write_wav(path: &Path, buffer: &StereoBuffer, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file {}", path.display()))?;
    for sample in buffer.interleaved() {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .context("failed to write sample")?;
    }
    writer.finalize().context("failed to finalize WAV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{ScoreEvent, TimedEvent};
    use ymsynth_engine::EngineConfig;

    fn one_note(off_at: f64) -> Score {
        Score::new(vec![
            TimedEvent {
                time: 0.0,
                event: ScoreEvent::NoteOn {
                    channel: 0,
                    pitch: 60,
                    velocity: 110,
                },
            },
            TimedEvent {
                time: off_at,
                event: ScoreEvent::NoteOff {
                    channel: 0,
                    pitch: 60,
                },
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_render_length_and_release() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let buffer = render_score(&mut engine, &one_note(0.25), 0.2);

        assert_eq!(buffer.frames(), 11_025 + 8_820);
        assert!(buffer.left[..11_025].iter().any(|s| s.abs() > 0.01));
        // Default release is 0.1 s, so the last 0.1 s is silent
        assert!(buffer.left[11_025 + 4_411..].iter().all(|s| *s == 0.0));
        assert_eq!(engine.active_voice_count(), 0);
        assert!(buffer.peak() > 0.0 && buffer.peak() <= 1.0);
    }

    #[test]
    fn test_interleaved_order() {
        let buffer = StereoBuffer {
            left: vec![0.1, 0.2],
            right: vec![-0.1, -0.2],
        };
        assert_eq!(buffer.interleaved(), vec![0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn test_write_wav_header() {
        let buffer = StereoBuffer {
            left: vec![0.5; 64],
            right: vec![-0.5; 64],
        };
        let path = std::env::temp_dir().join(format!("ymsynth-test-{}.wav", std::process::id()));
        write_wav(&path, &buffer, 22_050).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 128);
        std::fs::remove_file(&path).unwrap();
    }
}
