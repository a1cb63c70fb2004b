//! Prompt construction and response normalization for the song generation model.
//!
//! The model itself sits behind [`SongModel`]; this module only knows the contract: what
//! goes in (instructions plus a response schema) and how a JSON reply becomes a [`Song`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ComposerError;
use crate::instrument::{default_instrument, find_instrument, instruments_for, InstrumentCategory};
use crate::song::{Note, Song, Track};

pub const DEFAULT_TEMPO: f64 = 120.0;

pub const GENERATION_FAILED: &str =
    "Failed to generate song. The AI model might be busy or the prompt could be too complex. Please try again.";
pub const INVALID_STRUCTURE: &str =
    "AI returned an invalid song structure. Please try a different prompt.";

pub const SURPRISE_PROMPT: &str =
    "A completely random, unique, and interesting song. Surprise me with the genre, mood, and subject matter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub name: &'static str,
    pub prompt: &'static str,
}

pub static STYLE_PRESETS: [StylePreset; 6] = [
    StylePreset {
        name: "Pop Anthem",
        prompt: "An upbeat, catchy pop anthem with a powerful chorus and uplifting lyrics.",
    },
    StylePreset {
        name: "Hip-Hop",
        prompt: "A modern hip-hop track with a strong beat, confident lyrical flow, and a memorable hook.",
    },
    StylePreset {
        name: "Indie Folk",
        prompt: "An acoustic indie folk song with heartfelt lyrics, gentle melodies, and a warm, intimate feel.",
    },
    StylePreset {
        name: "Synthwave",
        prompt: "A retro-futuristic synthwave track with driving synth bass, shimmering pads, and a nostalgic 80s vibe.",
    },
    StylePreset {
        name: "Rock Ballad",
        prompt: "An emotional rock power ballad with soaring guitar solos, dramatic dynamics, and passionate vocals.",
    },
    StylePreset {
        name: "Country",
        prompt: "A classic country song about storytelling, with acoustic guitar, a steady rhythm, and sincere lyrics.",
    },
];

pub fn find_style(name: &str) -> Option<&'static StylePreset> {
    STYLE_PRESETS.iter().find(|p| p.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VocalStyle {
    #[default]
    Female,
    Male,
}

impl fmt::Display for VocalStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VocalStyle::Female => write!(f, "Female"),
            VocalStyle::Male => write!(f, "Male"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub vocal_style: VocalStyle,
    /// Lyrics to build the song around; blank means the model writes its own.
    pub lyrics: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: &str, vocal_style: VocalStyle) -> Self {
        GenerationRequest { prompt: prompt.to_string(), vocal_style, lyrics: None }
    }

    pub fn with_lyrics(mut self, lyrics: &str) -> Self {
        self.lyrics = Some(lyrics.to_string());
        self
    }

    fn supplied_lyrics(&self) -> Option<&str> {
        self.lyrics.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// A text model that answers a prompt with JSON matching `schema`.
pub trait SongModel {
    fn complete(&self, prompt: &str, schema: &Value) -> Result<String, ComposerError>;
}

/// The instrument library as `{ category: [{ name, category }] }`.
pub fn library_json() -> Value {
    let mut library = serde_json::Map::new();
    for category in InstrumentCategory::ALL {
        library.insert(category.to_string(), json!(instruments_for(category)));
    }
    Value::Object(library)
}

pub fn build_prompt(request: &GenerationRequest) -> Result<String, ComposerError> {
    let library = serde_json::to_string_pretty(&library_json())?;

    let mut prompt = format!(
        "Generate a complete song based on the following description: \"{}\".\n\n",
        request.prompt
    );
    prompt += &format!("The desired vocal style is: {} voice.\n\n", request.vocal_style);
    prompt += "The song should include: a title, genre, mood, tempo (in BPM), full lyrics, and a musical arrangement for one bar (16 steps).\n\n";
    prompt += "The arrangement should consist of several tracks (e.g., Drums, Bass, Chords, Lead).\n";
    prompt += "For each track, specify its role, a suitable instrument name, and a pattern of notes.\n";
    prompt += "A note is defined by its start time (from 0 to 1), duration (from 0 to 1), pitch (MIDI number), and velocity (from 0 to 1).\n\n";
    prompt += "For drum tracks, use MIDI numbers 36 for kick, 38 for snare, and 42 for hi-hat.\n\n";
    prompt += &format!("Please choose appropriate instruments from the following library:\n{}\n\n", library);

    match request.supplied_lyrics() {
        Some(lyrics) => {
            prompt += &format!(
                "Use the following lyrics for the song. Structure the song around them, creating a title, genre, mood, and musical arrangement that fit the lyrical content:\n\n---\n{}\n---\n\n",
                lyrics
            );
        }
        None => {
            prompt += "Write original lyrics for the song based on the prompt. The lyrics should be complete, with a clear structure (e.g., verses, chorus).\n\n";
        }
    }

    prompt += "Return only the JSON object matching the defined schema.";
    Ok(prompt)
}

/// JSON schema of the reply [`parse_response`] accepts.
pub fn response_schema() -> Value {
    let note = json!({
        "type": "object",
        "properties": {
            "time": { "type": "number", "description": "Start time of the note, from 0 (start of the bar) to 1 (end of the bar)." },
            "duration": { "type": "number", "description": "Duration of the note, from 0 to 1." },
            "pitch": { "type": "number", "description": "MIDI note number (e.g., 60 for C4). For Drums: 36 Kick, 38 Snare, 42 Hi-hat." },
            "velocity": { "type": "number", "description": "Velocity (loudness) of the note, from 0 to 1." }
        },
        "required": ["time", "duration", "pitch", "velocity"]
    });

    let track = json!({
        "type": "object",
        "properties": {
            "role": { "type": "string", "description": "One of the categories of the instrument library." },
            "instrumentName": { "type": "string", "description": "An instrument listed under the track's role in the library." },
            "pattern": { "type": "array", "description": "Notes for one bar (16 steps).", "items": note }
        },
        "required": ["role", "instrumentName", "pattern"]
    });

    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "genre": { "type": "string" },
            "mood": { "type": "string" },
            "lyrics": { "type": "string", "description": "Full lyrics with verses, chorus and bridge, separated by line breaks." },
            "tempo": { "type": "number", "description": "Beats per minute, typically between 60 and 180." },
            "tracks": { "type": "array", "description": "4-6 tracks making up the instrumentation.", "items": track }
        },
        "required": ["title", "genre", "mood", "lyrics", "tempo", "tracks"]
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrack {
    /// Kept loose: a missing or non-string role drops the track, not the reply
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(rename = "instrumentName", default)]
    pub instrument_name: Option<Value>,
    #[serde(default)]
    pub pattern: Option<Vec<Note>>,
}

/// A model reply as received, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSong {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub tempo: Option<f64>,
    #[serde(default)]
    pub tracks: Option<Vec<RawTrack>>,
}

impl RawSong {
    /// Validate against the instrument library and build the song.
    ///
    /// Tracks with an unknown role are dropped; an unknown instrument falls back to the
    /// role's first instrument. Ids keep the track's position in the reply.
    pub fn normalize(self) -> Result<Song, ComposerError> {
        let mut tracks = Vec::new();
        for (index, raw) in self.tracks.unwrap_or_default().into_iter().enumerate() {
            let role_name = match raw.role {
                Some(Value::String(role)) => role,
                other => {
                    log::warn!("Model returned track {} without a role ({:?}), skipping", index, other);
                    continue;
                }
            };
            let Ok(role) = role_name.parse::<InstrumentCategory>() else {
                log::warn!("Model returned invalid role '{}', skipping track {}", role_name, index);
                continue;
            };

            let name = match raw.instrument_name {
                Some(Value::String(name)) => name,
                _ => String::new(),
            };
            let instrument = find_instrument(role, &name).unwrap_or_else(|| {
                let fallback = default_instrument(role);
                log::warn!(
                    "Model returned invalid instrument '{}' for role '{}', using {}",
                    name, role, fallback.name
                );
                fallback
            });

            tracks.push(Track {
                id: format!("{}-{}", role_name, index),
                role,
                instrument,
                pattern: raw.pattern.unwrap_or_default(),
            });
        }

        let title = self.title.unwrap_or_default();
        let lyrics = self.lyrics.unwrap_or_default();
        if title.trim().is_empty() || lyrics.trim().is_empty() || tracks.is_empty() {
            return Err(ComposerError::GenerationError(INVALID_STRUCTURE.to_string()));
        }

        Ok(Song {
            title,
            genre: self.genre.unwrap_or_default(),
            mood: self.mood.unwrap_or_default(),
            lyrics,
            tempo: self.tempo.unwrap_or(DEFAULT_TEMPO),
            tracks,
        })
    }
}

pub fn parse_response(text: &str) -> Result<Song, ComposerError> {
    let raw: RawSong = serde_json::from_str(text)?;
    raw.normalize()
}

/// Ask `model` for a song. Any failure is logged and reported as one generic message.
pub fn generate_song<M: SongModel + ?Sized>(model: &M, request: &GenerationRequest) -> Result<Song, ComposerError> {
    let result = build_prompt(request)
        .and_then(|prompt| model.complete(&prompt, &response_schema()))
        .and_then(|reply| parse_response(&reply));

    match result {
        Ok(song) => {
            log::info!("Generated '{}' ({} tracks, {} BPM)", song.title, song.tracks.len(), song.tempo);
            Ok(song)
        }
        Err(e) => {
            log::error!("Error generating song: {}", e);
            Err(ComposerError::GenerationError(GENERATION_FAILED.to_string()))
        }
    }
}
