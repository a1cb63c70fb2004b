//! Voice renderers and role-based dispatch.
//!
//! Each renderer builds one [`VoiceNode`] for a single note and writes it into the output
//! context at an absolute start time. Nothing is returned; the node frees itself in the
//! mixer once its stop time has passed.

use std::sync::Arc;

use crate::automation::ParamTimeline;
use crate::context::OutputContext;
use crate::filter::{Biquad, FilterType, DEFAULT_Q};
use crate::graph::{VoiceKind, VoiceNode, VoiceSource};
use crate::instrument::InstrumentCategory;
use crate::song::{Note, Track};
use crate::utils::midi_to_freq;
use crate::voices::{Adsr, DrumPiece, NoiseEnvelope, PitchEnvelope, VoiceLibrary, VoicePreset};
use crate::waveform::WaveformType;

pub const TONAL_PEAK: f32 = 0.3;
pub const PITCHED_PEAK: f32 = 0.9;
pub const NOISE_PEAK: f32 = 0.7;

/// Extra run time after a tonal note ends so the release tail is not cut off.
pub const RELEASE_TAIL: f64 = 0.1;

/// Target of the noise decay; an exponential ramp cannot reach zero.
pub const NOISE_FLOOR: f32 = 0.001;

/// Attack, decay, optional hold, then a linear release that lands on zero exactly at
/// `start + duration`. Stages that would finish after the note has ended are left out, so
/// the release ramp starts from wherever the envelope had got to.
fn adsr_gain(start: f64, duration: f64, envelope: &Adsr, peak: f32, release_window: f64) -> ParamTimeline {
    let end = start + duration;
    let attack_end = start + envelope.attack;
    let decay_end = attack_end + envelope.decay;
    let release_start = end - release_window;
    let sustain = peak * envelope.sustain;

    let mut gain = ParamTimeline::new(0.0);
    gain.set_value_at_time(0.0, start);
    if attack_end < end {
        gain.linear_ramp_to_value_at_time(peak, attack_end);
    }
    if decay_end < end {
        gain.linear_ramp_to_value_at_time(sustain, decay_end);
    }
    if release_start > decay_end {
        gain.set_value_at_time(sustain, release_start);
    }
    gain.linear_ramp_to_value_at_time(0.0, end);
    gain
}

pub fn render_tonal<C: OutputContext + ?Sized>(
    ctx: &mut C,
    waveform: WaveformType,
    envelope: &Adsr,
    start: f64,
    duration: f64,
    velocity: f32,
    pitch: f64,
) {
    let mut frequency = ParamTimeline::new(0.0);
    frequency.set_value_at_time(midi_to_freq(pitch) as f32, start);

    let release_window = duration.min(envelope.release);
    let gain = adsr_gain(start, duration, envelope, velocity * TONAL_PEAK, release_window);

    ctx.schedule(VoiceNode {
        kind: VoiceKind::Tonal,
        source: VoiceSource::Oscillator { waveform, frequency, phase: 0.0 },
        gain,
        start,
        stop: start + duration + RELEASE_TAIL,
    });
}

pub fn render_pitched_percussive<C: OutputContext + ?Sized>(
    ctx: &mut C,
    waveform: WaveformType,
    envelope: &Adsr,
    pitch_env: &PitchEnvelope,
    start: f64,
    duration: f64,
    velocity: f32,
) {
    // Pitch runs on its own clock, independent of the amplitude envelope
    let mut frequency = ParamTimeline::new(pitch_env.start);
    frequency
        .set_value_at_time(pitch_env.start, start)
        .linear_ramp_to_value_at_time(pitch_env.start, start + pitch_env.attack)
        .exponential_ramp_to_value_at_time(pitch_env.end, start + pitch_env.attack + pitch_env.decay);

    let gain = adsr_gain(start, duration, envelope, velocity * PITCHED_PEAK, envelope.release);

    ctx.schedule(VoiceNode {
        kind: VoiceKind::PitchedPercussive,
        source: VoiceSource::Oscillator { waveform, frequency, phase: 0.0 },
        gain,
        start,
        stop: start + duration,
    });
}

pub fn render_noise_percussive<C: OutputContext + ?Sized>(
    ctx: &mut C,
    filter_type: FilterType,
    frequency: f32,
    envelope: &NoiseEnvelope,
    start: f64,
    duration: f64,
    velocity: f32,
) {
    let sample_rate = ctx.sample_rate();
    let buffer: Vec<f32> = (0..sample_rate as usize)
        .map(|_| fastrand::f32() * 2.0 - 1.0)
        .collect();

    let mut gain = ParamTimeline::new(0.0);
    gain.set_value_at_time(0.0, start)
        .linear_ramp_to_value_at_time(velocity * NOISE_PEAK, start + envelope.attack)
        .exponential_ramp_to_value_at_time(NOISE_FLOOR, start + envelope.attack + envelope.decay);

    ctx.schedule(VoiceNode {
        kind: VoiceKind::NoisePercussive,
        source: VoiceSource::Noise {
            buffer: Arc::new(buffer),
            filter: Biquad::new(filter_type, frequency, DEFAULT_Q, sample_rate),
            position: 0,
        },
        gain,
        start,
        stop: start + duration,
    });
}

/// Route one note to the renderer its track role and preset call for.
///
/// Returns `false` when the note was dropped: an unmapped drum pitch, a preset missing from
/// the library, or a preset shape the role cannot play.
pub fn schedule_note<C: OutputContext + ?Sized>(
    ctx: &mut C,
    library: &VoiceLibrary,
    track: &Track,
    note: &Note,
    start: f64,
    bar_duration: f64,
) -> bool {
    let duration = note.duration * bar_duration;
    let velocity = note.velocity as f32;

    if track.role == InstrumentCategory::Drums {
        let Some(piece) = DrumPiece::from_pitch(note.pitch) else {
            return false;
        };
        match library.lookup(&piece.preset_key(&track.instrument.name)) {
            Some(VoicePreset::NoisePercussive { filter, frequency, envelope }) => {
                render_noise_percussive(ctx, *filter, *frequency, envelope, start, duration, velocity);
                true
            }
            Some(VoicePreset::PitchedPercussive { waveform, envelope, pitch }) => {
                render_pitched_percussive(ctx, *waveform, envelope, pitch, start, duration, velocity);
                true
            }
            Some(VoicePreset::Tonal { .. }) | None => false,
        }
    } else {
        match library.lookup(&track.instrument.name) {
            Some(VoicePreset::Tonal { waveform, envelope })
            | Some(VoicePreset::PitchedPercussive { waveform, envelope, .. }) => {
                render_tonal(ctx, *waveform, envelope, start, duration, velocity, note.pitch);
                true
            }
            Some(VoicePreset::NoisePercussive { .. }) | None => false,
        }
    }
}
