//! Scheduled voice nodes and the mixer that plays them.
//!
//! A [`VoiceNode`] is a self-contained, future-dated sound: a source, a gain automation
//! timeline and start/stop times on the output clock. The [`Mixer`] sums every live node
//! and frees nodes once their stop time has passed.

use std::sync::Arc;

use crate::automation::ParamTimeline;
use crate::filter::Biquad;
use crate::waveform::WaveformType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceKind {
    Tonal,
    PitchedPercussive,
    NoisePercussive,
}

#[derive(Debug, Clone)]
pub enum VoiceSource {
    Oscillator {
        waveform: WaveformType,
        frequency: ParamTimeline,
        phase: f64,
    },
    Noise {
        buffer: Arc<Vec<f32>>,
        filter: Biquad,
        position: usize,
    },
}

#[derive(Debug, Clone)]
pub struct VoiceNode {
    pub kind: VoiceKind,
    pub source: VoiceSource,
    pub gain: ParamTimeline,
    pub start: f64,
    pub stop: f64,
}

impl VoiceNode {
    /// Frequency automation, for oscillator-backed voices.
    pub fn frequency(&self) -> Option<&ParamTimeline> {
        match &self.source {
            VoiceSource::Oscillator { frequency, .. } => Some(frequency),
            VoiceSource::Noise { .. } => None,
        }
    }

    pub fn is_finished(&self, time: f64) -> bool {
        time >= self.stop
    }

    /// Produce the sample at `time` and advance the source by one frame.
    pub fn render_sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        if time < self.start || time >= self.stop {
            return 0.0;
        }

        let raw = match &mut self.source {
            VoiceSource::Oscillator { waveform, frequency, phase } => {
                let out = waveform.generate_sample(*phase as f32);
                *phase += frequency.value_at(time) as f64 / sample_rate as f64;
                *phase -= phase.floor();
                out
            }
            VoiceSource::Noise { buffer, filter, position } => {
                // One-shot buffer; silence once it runs out
                let x = buffer.get(*position).copied().unwrap_or(0.0);
                *position += 1;
                filter.process(x)
            }
        };

        raw * self.gain.value_at(time)
    }
}

/// Sums live voices. Owned by whichever thread renders audio.
pub struct Mixer {
    sample_rate: f32,
    voices: Vec<VoiceNode>,
}

impl Mixer {
    pub fn new(sample_rate: f32) -> Self {
        Mixer { sample_rate, voices: Vec::with_capacity(64) }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn add(&mut self, voice: VoiceNode) {
        self.voices.push(voice);
    }

    /// Drop voices that have not started by `time`. Sounding voices are left alone.
    pub fn cancel_from(&mut self, time: f64) {
        self.voices.retain(|v| v.start < time);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Render `frames` mono samples beginning at output frame `first_frame`, handing each to
    /// `write` together with its index.
    pub fn render<F: FnMut(usize, f32)>(&mut self, first_frame: u64, frames: usize, mut write: F) {
        let sr = self.sample_rate as f64;
        for i in 0..frames {
            let time = (first_frame + i as u64) as f64 / sr;
            let mut output = 0.0;
            for voice in self.voices.iter_mut() {
                output += voice.render_sample(time, self.sample_rate);
            }
            write(i, output.clamp(-1.0, 1.0));
        }

        let end_time = (first_frame + frames as u64) as f64 / sr;
        self.voices.retain(|v| !v.is_finished(end_time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_voice(start: f64, stop: f64) -> VoiceNode {
        let mut frequency = ParamTimeline::new(440.0);
        frequency.set_value_at_time(440.0, start);
        let mut gain = ParamTimeline::new(0.0);
        gain.set_value_at_time(0.5, start);
        VoiceNode {
            kind: VoiceKind::Tonal,
            source: VoiceSource::Oscillator { waveform: WaveformType::Square, frequency, phase: 0.0 },
            gain,
            start,
            stop,
        }
    }

    #[test]
    fn voice_is_silent_outside_its_window() {
        let mut mixer = Mixer::new(1000.0);
        mixer.add(sine_voice(0.01, 0.02));

        let mut out = vec![0.0; 30];
        mixer.render(0, 30, |i, s| out[i] = s);

        assert!(out[..10].iter().all(|s| *s == 0.0));
        assert!(out[10..20].iter().all(|s| s.abs() == 0.5));
        assert!(out[20..].iter().all(|s| *s == 0.0));
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn voices_are_kept_until_they_stop() {
        let mut mixer = Mixer::new(1000.0);
        mixer.add(sine_voice(0.5, 1.0));
        mixer.render(0, 100, |_, _| {});
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn cancel_only_removes_unstarted_voices() {
        let mut mixer = Mixer::new(1000.0);
        mixer.add(sine_voice(0.0, 1.0));
        mixer.add(sine_voice(0.2, 1.0));
        mixer.cancel_from(0.1);
        assert_eq!(mixer.active_voices(), 1);
    }
}
