//! Composer session: the application state behind a front end.
//!
//! Holds the user's inputs, the edit history of the current song, saved presets and the
//! transport. All operations are synchronous; a front end calls [`Composer::poll`] from its
//! own loop to keep the scheduler fed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ComposerConfig;
use crate::context::AudioBackend;
use crate::error::ComposerError;
use crate::generation::{find_style, generate_song, GenerationRequest, SongModel, VocalStyle, SURPRISE_PROMPT};
use crate::history::History;
use crate::instrument::Instrument;
use crate::presets::{PresetStore, UserPreset};
use crate::scheduler::Scheduler;
use crate::song::Song;
use crate::voices::VoiceLibrary;

pub struct Composer<B: AudioBackend> {
    prompt: String,
    lyrics: String,
    vocal_style: VocalStyle,
    history: Option<History>,
    presets: PresetStore,
    scheduler: Scheduler<B>,
    max_playback: Duration,
    playing_since: Option<Instant>,
    error: Option<ComposerError>,
}

impl<B: AudioBackend> Composer<B> {
    pub fn new(backend: B, config: ComposerConfig) -> Self {
        let (presets, error) = match PresetStore::open(&config.presets_path) {
            Ok(store) => (store, None),
            Err(e) => {
                log::error!("{}", e);
                (PresetStore::empty(&config.presets_path), Some(e))
            }
        };

        Composer {
            prompt: String::new(),
            lyrics: String::new(),
            vocal_style: VocalStyle::default(),
            history: None,
            presets,
            scheduler: Scheduler::new(backend, Arc::new(VoiceLibrary::builtin()), config.scheduler),
            max_playback: config.max_playback,
            playing_since: None,
            error,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    pub fn lyrics(&self) -> &str {
        &self.lyrics
    }

    pub fn set_lyrics(&mut self, lyrics: &str) {
        self.lyrics = lyrics.to_string();
    }

    pub fn vocal_style(&self) -> VocalStyle {
        self.vocal_style
    }

    pub fn set_vocal_style(&mut self, vocal_style: VocalStyle) {
        self.vocal_style = vocal_style;
    }

    pub fn song(&self) -> Option<&Arc<Song>> {
        self.history.as_ref().map(|h| h.current())
    }

    pub fn scheduler(&self) -> &Scheduler<B> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<B> {
        &mut self.scheduler
    }

    pub fn error(&self) -> Option<&ComposerError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn fail(&mut self, e: ComposerError) -> ComposerError {
        self.error = Some(e.clone());
        e
    }

    /// Generate a new song from the current inputs. Clears the history first.
    pub fn generate<M: SongModel + ?Sized>(&mut self, model: &M) -> Result<Arc<Song>, ComposerError> {
        self.stop();
        self.error = None;
        self.history = None;

        let mut request = GenerationRequest::new(&self.prompt, self.vocal_style);
        if !self.lyrics.trim().is_empty() {
            request = request.with_lyrics(&self.lyrics);
        }

        let song = generate_song(model, &request).map_err(|e| self.fail(e))?;
        if self.lyrics.is_empty() && !song.lyrics.is_empty() {
            self.lyrics = song.lyrics.clone();
        }

        let history = self.history.insert(History::new(song));
        Ok(Arc::clone(history.current()))
    }

    pub fn surprise_me<M: SongModel + ?Sized>(&mut self, model: &M) -> Result<Arc<Song>, ComposerError> {
        self.prompt = SURPRISE_PROMPT.to_string();
        self.lyrics.clear();
        self.generate(model)
    }

    /// Fill the prompt from a built-in style. Returns false for an unknown style name.
    pub fn select_style(&mut self, name: &str) -> bool {
        match find_style(name) {
            Some(style) => {
                self.prompt = style.prompt.to_string();
                true
            }
            None => false,
        }
    }

    pub fn presets(&self) -> &[UserPreset] {
        self.presets.list()
    }

    pub fn save_preset(&mut self, name: &str) -> Result<UserPreset, ComposerError> {
        let Some(song) = self.song().map(Arc::clone) else {
            return Err(self.fail(ComposerError::PresetError("No song to save!".to_string())));
        };
        self.presets
            .save(name, &song, &self.prompt, &self.lyrics, self.vocal_style)
            .map_err(|e| self.fail(e))
    }

    /// Restore a preset's inputs and make its song the only history entry.
    pub fn load_preset(&mut self, id: &str) -> Result<Arc<Song>, ComposerError> {
        let Some(preset) = self.presets.get(id).cloned() else {
            return Err(self.fail(ComposerError::PresetError(format!("No preset with id {}", id))));
        };

        self.stop();
        self.prompt = preset.prompt;
        self.lyrics = preset.lyrics;
        self.vocal_style = preset.vocal_style;
        let history = self.history.insert(History::new(preset.song));
        log::info!("Loaded preset '{}'", preset.name);
        Ok(Arc::clone(history.current()))
    }

    pub fn delete_preset(&mut self, id: &str) -> Result<bool, ComposerError> {
        self.presets.delete(id).map_err(|e| self.fail(e))
    }

    /// Swap the instrument of one track as a new history entry. A playing loop picks the
    /// change up at its next bar.
    pub fn change_instrument(&mut self, track_index: usize, instrument: Instrument) -> Result<Arc<Song>, ComposerError> {
        let Some(history) = self.history.as_mut() else {
            return Err(ComposerError::InvalidInstrument("No song loaded".to_string()));
        };

        let edited = history.current().with_instrument(track_index, instrument)?;
        let song = Arc::clone(history.commit(edited));
        self.scheduler.set_song(Arc::clone(&song));
        Ok(song)
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(|h| h.can_redo())
    }

    /// Step back one edit. Stops playback when it moves.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.stop();
        self.history.as_mut().and_then(|h| h.undo()).is_some()
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.stop();
        self.history.as_mut().and_then(|h| h.redo()).is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn play(&mut self) -> bool {
        self.play_at(Instant::now())
    }

    /// Start the loop with `now` as the transport origin. Returns whether it is running.
    pub fn play_at(&mut self, now: Instant) -> bool {
        let song = self.song().map(Arc::clone);
        if song.is_none() {
            return false;
        }
        self.scheduler.start_at(song, now);
        self.playing_since = self.scheduler.is_running().then_some(now);
        self.is_playing()
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.playing_since = None;
    }

    pub fn toggle_play(&mut self) -> bool {
        if self.is_playing() {
            self.stop();
            false
        } else {
            self.play()
        }
    }

    /// Drive the transport. Stops by itself once the playback limit is reached.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(since) = self.playing_since else {
            return false;
        };
        if now.saturating_duration_since(since) >= self.max_playback {
            log::info!("Reached playback limit of {:?}", self.max_playback);
            self.stop();
            return false;
        }
        self.scheduler.poll(now)
    }

    /// Time since play, capped at the playback limit. Zero while stopped.
    pub fn playback_position(&self, now: Instant) -> Duration {
        self.playing_since
            .map(|since| now.saturating_duration_since(since).min(self.max_playback))
            .unwrap_or_default()
    }
}
