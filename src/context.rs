//! Output contexts: the clock the scheduler reads and the sink it writes voices into.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::error::ComposerError;
use crate::graph::{Mixer, VoiceNode};

/// A running audio graph with its own clock. Voices are written with absolute timestamps
/// and play whenever the clock reaches them.
pub trait OutputContext {
    /// Seconds on the output clock. Frozen while suspended.
    fn current_time(&self) -> f64;
    fn sample_rate(&self) -> f32;
    fn schedule(&mut self, voice: VoiceNode);
    /// Retract voices whose start time is at or after `time`.
    fn cancel_from(&mut self, time: f64);
    fn resume(&mut self) -> Result<(), ComposerError>;
    fn suspend(&mut self) -> Result<(), ComposerError>;
}

/// Creates output contexts on demand.
pub trait AudioBackend {
    type Context: OutputContext;
    fn open(&mut self) -> Result<Self::Context, ComposerError>;
}

enum MixerCommand {
    Schedule(VoiceNode),
    CancelFrom(f64),
}

/// Queue a command for the audio callback. A full queue drops the command with a warning.
fn send_command(tx: &Sender<MixerCommand>, cmd: MixerCommand) -> bool {
    let what = match &cmd {
        MixerCommand::Schedule(_) => "voice",
        MixerCommand::CancelFrom(_) => "cancel request",
    };
    if tx.try_send(cmd).is_err() {
        log::warn!("Mixer queue full, dropping {}", what);
        return false;
    }
    true
}

/// Default host output device via cpal.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

pub struct CpalContext {
    tx: Sender<MixerCommand>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
    stream: cpal::Stream,
}

impl AudioBackend for CpalBackend {
    type Context = CpalContext;

    fn open(&mut self) -> Result<CpalContext, ComposerError> {
        let host = cpal::default_host();
        let device = host.default_output_device()
            .ok_or_else(|| ComposerError::AudioError("No output device found".to_string()))?;
        let config = device.default_output_config()
            .map_err(|e| ComposerError::AudioError(e.to_string()))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(ComposerError::AudioError(format!(
                "Unsupported sample format {:?} (only f32 is supported)",
                config.sample_format()
            )));
        }

        let stream_config: cpal::StreamConfig = config.config();
        let sample_rate = stream_config.sample_rate.0 as f32;
        let channels = stream_config.channels as usize;

        let (tx, rx) = crossbeam_channel::bounded::<MixerCommand>(1024);
        let clock = Arc::new(AtomicU64::new(0));

        let stream = build_output_stream(&device, &stream_config, rx, Arc::clone(&clock), channels)?;
        log::info!(
            "Opened output device {:?}: {} Hz, {} channels",
            device.name().unwrap_or_default(),
            sample_rate,
            channels
        );

        Ok(CpalContext { tx, clock, sample_rate, stream })
    }
}

fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<MixerCommand>,
    clock: Arc<AtomicU64>,
    channels: usize,
) -> Result<cpal::Stream, ComposerError> {
    let mut mixer = Mixer::new(config.sample_rate.0 as f32);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                match cmd {
                    MixerCommand::Schedule(voice) => mixer.add(voice),
                    MixerCommand::CancelFrom(time) => mixer.cancel_from(time),
                }
            }

            let frames = data.len() / channels;
            let first_frame = clock.load(Ordering::Acquire);
            mixer.render(first_frame, frames, |i, sample| {
                for out in &mut data[i * channels..(i + 1) * channels] {
                    *out = sample;
                }
            });
            clock.store(first_frame + frames as u64, Ordering::Release);
        },
        |err| log::error!("Stream error: {}", err),
        None,
    ).map_err(|e| ComposerError::AudioError(e.to_string()))?;

    Ok(stream)
}

impl OutputContext for CpalContext {
    fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn schedule(&mut self, voice: VoiceNode) {
        send_command(&self.tx, MixerCommand::Schedule(voice));
    }

    fn cancel_from(&mut self, time: f64) {
        send_command(&self.tx, MixerCommand::CancelFrom(time));
    }

    fn resume(&mut self) -> Result<(), ComposerError> {
        self.stream.play().map_err(|e| ComposerError::AudioError(e.to_string()))
    }

    fn suspend(&mut self) -> Result<(), ComposerError> {
        self.stream.pause().map_err(|e| ComposerError::AudioError(e.to_string()))
    }
}

/// Headless backend: the clock only moves when [`OfflineContext::render`] is called.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    sample_rate: f32,
    available: bool,
    record: bool,
}

impl OfflineBackend {
    /// Contexts keep a copy of every scheduled voice for inspection. Meant for tests and
    /// short renders; see [`OfflineBackend::streaming`] for long ones.
    pub fn new(sample_rate: f32) -> Self {
        OfflineBackend { sample_rate, available: true, record: true }
    }

    /// Contexts only hold live voices, so memory stays flat however long they render.
    pub fn streaming(sample_rate: f32) -> Self {
        OfflineBackend { sample_rate, available: true, record: false }
    }

    /// A backend whose `open` always fails, like a host without an output device.
    pub fn unavailable() -> Self {
        OfflineBackend { sample_rate: 44_100.0, available: false, record: false }
    }
}

impl AudioBackend for OfflineBackend {
    type Context = OfflineContext;

    fn open(&mut self) -> Result<OfflineContext, ComposerError> {
        if !self.available {
            return Err(ComposerError::AudioError("No output device found".to_string()));
        }
        let mut ctx = OfflineContext::new(self.sample_rate);
        ctx.record = self.record;
        Ok(ctx)
    }
}

pub struct OfflineContext {
    mixer: Mixer,
    frame: u64,
    running: bool,
    record: bool,
    scheduled: Vec<VoiceNode>,
}

impl OfflineContext {
    pub fn new(sample_rate: f32) -> Self {
        OfflineContext {
            mixer: Mixer::new(sample_rate),
            frame: 0,
            running: false,
            record: true,
            scheduled: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Every voice ever scheduled, in dispatch order. Empty when not recording.
    pub fn scheduled(&self) -> &[VoiceNode] {
        &self.scheduled
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }

    /// Render `seconds` of mono audio and advance the clock. Renders nothing while suspended.
    pub fn render(&mut self, seconds: f64) -> Vec<f32> {
        if !self.running {
            return Vec::new();
        }
        let frames = (seconds * self.mixer.sample_rate() as f64).round() as usize;
        let mut out = vec![0.0; frames];
        self.mixer.render(self.frame, frames, |i, s| out[i] = s);
        self.frame += frames as u64;
        out
    }
}

impl OutputContext for OfflineContext {
    fn current_time(&self) -> f64 {
        self.frame as f64 / self.mixer.sample_rate() as f64
    }

    fn sample_rate(&self) -> f32 {
        self.mixer.sample_rate()
    }

    fn schedule(&mut self, voice: VoiceNode) {
        if self.record {
            self.scheduled.push(voice.clone());
        }
        self.mixer.add(voice);
    }

    fn cancel_from(&mut self, time: f64) {
        self.mixer.cancel_from(time);
    }

    fn resume(&mut self) -> Result<(), ComposerError> {
        self.running = true;
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), ComposerError> {
        self.running = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_clock_moves_only_while_running() {
        let mut ctx = OfflineBackend::new(1000.0).open().unwrap();
        assert!(ctx.render(1.0).is_empty());
        assert_eq!(ctx.current_time(), 0.0);

        ctx.resume().unwrap();
        assert_eq!(ctx.render(0.5).len(), 500);
        assert_eq!(ctx.current_time(), 0.5);

        ctx.suspend().unwrap();
        ctx.render(0.5);
        assert_eq!(ctx.current_time(), 0.5);
    }

    fn click(start: f64) -> VoiceNode {
        let mut gain = crate::automation::ParamTimeline::new(0.0);
        gain.set_value_at_time(0.5, start);
        VoiceNode {
            kind: crate::graph::VoiceKind::Tonal,
            source: crate::graph::VoiceSource::Oscillator {
                waveform: crate::waveform::WaveformType::Square,
                frequency: crate::automation::ParamTimeline::new(100.0),
                phase: 0.0,
            },
            gain,
            start,
            stop: start + 0.01,
        }
    }

    #[test]
    fn streaming_context_keeps_only_live_voices() {
        let mut ctx = OfflineBackend::streaming(1000.0).open().unwrap();
        ctx.resume().unwrap();
        for n in 0..100 {
            ctx.schedule(click(n as f64 * 0.02));
        }
        assert!(ctx.scheduled().is_empty());
        assert_eq!(ctx.active_voices(), 100);

        let audio = ctx.render(2.0);
        assert!(audio.iter().any(|s| s.abs() > 0.1));
        assert_eq!(ctx.active_voices(), 0);
    }

    #[test]
    fn full_mixer_queue_drops_commands() {
        let (tx, rx) = crossbeam_channel::bounded::<MixerCommand>(1);
        assert!(send_command(&tx, MixerCommand::CancelFrom(0.0)));
        assert!(!send_command(&tx, MixerCommand::CancelFrom(1.0)));
        assert!(!send_command(&tx, MixerCommand::Schedule(click(0.0))));
        assert!(matches!(rx.try_recv(), Ok(MixerCommand::CancelFrom(t)) if t == 0.0));
        assert!(send_command(&tx, MixerCommand::CancelFrom(2.0)));
    }

    #[test]
    fn unavailable_backend_fails_to_open() {
        let err = OfflineBackend::unavailable().open().err().unwrap();
        assert!(matches!(err, ComposerError::AudioError(_)));
    }
}
