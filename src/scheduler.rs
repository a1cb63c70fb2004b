//! Look-ahead note scheduler.
//!
//! A coarse wall-clock timer (the lookahead interval, ~25 ms) drives [`Scheduler::tick`].
//! Each tick commits every bar that begins before `output clock + schedule_ahead` to the
//! output context, with absolute timestamps on the output clock. The bar cursor advances in
//! whole bar durations, never by observed tick intervals, so repeated bars do not drift.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::SchedulerConfig;
use crate::context::{AudioBackend, OutputContext};
use crate::render::schedule_note;
use crate::song::Song;
use crate::voices::VoiceLibrary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Periodic timer handle. Dropping it cancels the timer.
#[derive(Debug, Clone, Copy)]
struct Ticker {
    interval: Duration,
    next_deadline: Instant,
}

impl Ticker {
    fn new(interval: Duration, now: Instant) -> Self {
        Ticker { interval, next_deadline: now + interval }
    }

    fn due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    fn advance(&mut self, now: Instant) {
        self.next_deadline += self.interval;
        // Fell behind (host stalled); don't fire a burst of catch-up ticks
        if self.next_deadline <= now {
            self.next_deadline = now + self.interval;
        }
    }
}

/// Schedule every note of `song` for the bar starting at `bar_start`.
///
/// Track order, then pattern order. Returns how many voices were written.
pub fn schedule_bar<C: OutputContext + ?Sized>(
    ctx: &mut C,
    library: &VoiceLibrary,
    song: &Song,
    bar_start: f64,
    bar_duration: f64,
) -> usize {
    let mut dispatched = 0;
    for track in &song.tracks {
        for note in &track.pattern {
            let start = bar_start + note.time * bar_duration;
            if schedule_note(ctx, library, track, note, start, bar_duration) {
                dispatched += 1;
            }
        }
    }
    dispatched
}

/// Shortest bar the scheduler will loop (4800 BPM). Keeps the bars committed per tick bounded.
pub const MIN_BAR_DURATION: f64 = 0.05;

fn valid_bar(bar: f64) -> bool {
    bar.is_finite() && bar >= MIN_BAR_DURATION
}

pub struct Scheduler<B: AudioBackend> {
    backend: B,
    context: Option<B::Context>,
    library: Arc<VoiceLibrary>,
    config: SchedulerConfig,
    state: SchedulerState,
    song: Option<Arc<Song>>,
    next_bar_time: f64,
    bars_scheduled: u64,
    ticker: Option<Ticker>,
}

impl<B: AudioBackend> Scheduler<B> {
    pub fn new(backend: B, library: Arc<VoiceLibrary>, config: SchedulerConfig) -> Self {
        Scheduler {
            backend,
            context: None,
            library,
            config,
            state: SchedulerState::Stopped,
            song: None,
            next_bar_time: 0.0,
            bars_scheduled: 0,
            ticker: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Output-clock time at which the next unscheduled bar begins.
    pub fn next_bar_time(&self) -> f64 {
        self.next_bar_time
    }

    /// Bars committed since the last start.
    pub fn bars_scheduled(&self) -> u64 {
        self.bars_scheduled
    }

    pub fn song(&self) -> Option<&Arc<Song>> {
        self.song.as_ref()
    }

    pub fn library(&self) -> &VoiceLibrary {
        &self.library
    }

    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> Option<&mut B::Context> {
        self.context.as_mut()
    }

    /// Wall-clock instant of the next tick, while running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.ticker.map(|t| t.next_deadline)
    }

    pub fn start(&mut self, song: Option<Arc<Song>>) -> SchedulerState {
        self.start_at(song, Instant::now())
    }

    /// Enter Running with `song`, timing ticks from `now`.
    ///
    /// Setup problems (no song, unusable tempo, no output device) are logged once and leave
    /// the scheduler Stopped. Starting while already running restarts from the top of the bar.
    pub fn start_at(&mut self, song: Option<Arc<Song>>, now: Instant) -> SchedulerState {
        let Some(song) = song else {
            log::warn!("Nothing to play: no song loaded");
            return self.state;
        };
        if !valid_bar(song.bar_duration()) {
            log::warn!("Cannot play '{}': tempo {} BPM is not playable", song.title, song.tempo);
            return self.state;
        }

        self.ticker = None;

        if self.context.is_none() {
            match self.backend.open() {
                Ok(ctx) => self.context = Some(ctx),
                Err(e) => {
                    log::error!("Audio output unavailable, playback not started: {}", e);
                    self.state = SchedulerState::Stopped;
                    return self.state;
                }
            }
        }

        let Some(ctx) = self.context.as_mut() else {
            return self.state;
        };
        if let Err(e) = ctx.resume() {
            log::error!("Could not resume audio output: {}", e);
            self.state = SchedulerState::Stopped;
            return self.state;
        }

        self.next_bar_time = ctx.current_time();
        self.bars_scheduled = 0;
        log::info!(
            "Playing '{}' at {} BPM ({} tracks) from t={:.3}s",
            song.title,
            song.tempo,
            song.tracks.len(),
            self.next_bar_time
        );
        self.song = Some(song);
        self.state = SchedulerState::Running;
        self.ticker = Some(Ticker::new(self.config.lookahead, now));

        // Commit the first window right away instead of waiting a full interval
        self.tick();
        self.state
    }

    /// Replace the song without touching the bar cursor; takes effect from the next bar.
    pub fn set_song(&mut self, song: Arc<Song>) {
        if self.is_running() {
            self.song = Some(song);
        }
    }

    pub fn stop(&mut self) {
        self.ticker = None;
        if self.state == SchedulerState::Stopped {
            return;
        }

        if let Some(ctx) = self.context.as_mut() {
            if self.config.cancel_pending_on_stop {
                ctx.cancel_from(ctx.current_time());
            }
            if let Err(e) = ctx.suspend() {
                log::warn!("Could not suspend audio output: {}", e);
            }
        }

        self.song = None;
        self.state = SchedulerState::Stopped;
        log::info!("Playback stopped after {} bars", self.bars_scheduled);
    }

    /// Commit every bar that starts inside the look-ahead window. Returns voices written.
    pub fn tick(&mut self) -> usize {
        if self.state != SchedulerState::Running {
            return 0;
        }
        let (Some(ctx), Some(song)) = (self.context.as_mut(), self.song.as_ref()) else {
            return 0;
        };

        let horizon = ctx.current_time() + self.config.schedule_ahead;
        let mut dispatched = 0;

        while self.next_bar_time < horizon {
            // Read once per bar: tempo edits land on bar boundaries
            let bar = song.bar_duration();
            if !valid_bar(bar) {
                log::debug!("Tempo {} BPM is not playable, holding at t={:.3}s", song.tempo, self.next_bar_time);
                break;
            }
            dispatched += schedule_bar(ctx, &self.library, song, self.next_bar_time, bar);
            log::debug!("Scheduled bar {} at t={:.3}s", self.bars_scheduled, self.next_bar_time);
            self.next_bar_time += bar;
            self.bars_scheduled += 1;
        }

        dispatched
    }

    /// Fire the tick if the timer is due at `now`. Returns whether it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(ticker) = self.ticker.as_mut() else {
            return false;
        };
        if !ticker.due(now) {
            return false;
        }
        ticker.advance(now);
        self.tick();
        true
    }

    /// Drive the timer on the calling thread for `duration`, sleeping between ticks.
    pub fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.poll(now);
            let wake = self.next_deadline().unwrap_or(deadline).min(deadline);
            if let Some(wait) = wake.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }
}
