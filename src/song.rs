use serde::{Deserialize, Serialize};

use crate::error::ComposerError;
use crate::instrument::{Instrument, InstrumentCategory};
use crate::utils::bar_duration;

/// One note of a one-bar loop. Times are fractions of the bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub time: f64,
    pub duration: f64,
    pub pitch: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub role: InstrumentCategory,
    pub instrument: Instrument,
    pub pattern: Vec<Note>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub genre: String,
    pub mood: String,
    pub lyrics: String,
    pub tempo: f64,
    pub tracks: Vec<Track>,
}

impl Song {
    /// Seconds per bar (four beats) at the song tempo.
    pub fn bar_duration(&self) -> f64 {
        bar_duration(self.tempo)
    }

    /// A copy of the song with `tracks[track_index]` playing `instrument`.
    ///
    /// The instrument must belong to the track's role.
    pub fn with_instrument(&self, track_index: usize, instrument: Instrument) -> Result<Song, ComposerError> {
        let track = self.tracks.get(track_index).ok_or_else(|| {
            ComposerError::InvalidInstrument(format!("No track at index {}", track_index))
        })?;

        if instrument.category != track.role {
            return Err(ComposerError::InvalidInstrument(format!(
                "{} is a {} instrument, track {} is {}",
                instrument.name, instrument.category, track.id, track.role
            )));
        }

        let mut song = self.clone();
        song.tracks[track_index].instrument = instrument;
        Ok(song)
    }

    pub fn tracks_with_role(&self, role: InstrumentCategory) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.role == role)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn note(time: f64, duration: f64, pitch: f64) -> Note {
        Note { time, duration, pitch, velocity: 0.8 }
    }

    pub fn track(index: usize, role: InstrumentCategory, instrument: &str, pattern: Vec<Note>) -> Track {
        Track {
            id: format!("{}-{}", role, index),
            role,
            instrument: Instrument::new(instrument, role),
            pattern,
        }
    }

    pub fn demo_song() -> Song {
        Song {
            title: "Night Drive".to_string(),
            genre: "Synthwave".to_string(),
            mood: "Nostalgic".to_string(),
            lyrics: "Neon on the rain\nwe keep driving".to_string(),
            tempo: 120.0,
            tracks: vec![
                track(0, InstrumentCategory::Drums, "808 Kit", vec![
                    note(0.0, 0.25, 36.0),
                    note(0.25, 0.125, 42.0),
                    note(0.5, 0.25, 38.0),
                ]),
                track(1, InstrumentCategory::Bass, "Synth Bass", vec![
                    note(0.0, 0.5, 36.0),
                    note(0.5, 0.5, 43.0),
                ]),
                track(2, InstrumentCategory::Chords, "Grand Piano", vec![
                    note(0.0, 1.0, 60.0),
                    note(0.0, 1.0, 64.0),
                ]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::demo_song;
    use super::*;

    #[test]
    fn swap_replaces_only_that_instrument() {
        let song = demo_song();
        let electric = Instrument::new("Electric Piano", InstrumentCategory::Chords);
        let swapped = song.with_instrument(2, electric.clone()).unwrap();

        assert_eq!(swapped.tracks[2].instrument, electric);
        let mut expected = song.clone();
        expected.tracks[2].instrument = electric;
        assert_eq!(swapped, expected);
        assert_eq!(song.tracks[2].instrument.name, "Grand Piano");
    }

    #[test]
    fn swap_rejects_other_categories() {
        let song = demo_song();
        let err = song.with_instrument(0, Instrument::new("Sub Bass", InstrumentCategory::Bass));
        assert!(matches!(err, Err(ComposerError::InvalidInstrument(_))));
        assert!(song.with_instrument(9, Instrument::new("808 Kit", InstrumentCategory::Drums)).is_err());
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(demo_song()).unwrap();
        assert_eq!(json["tracks"][0]["role"], "Drums");
        assert_eq!(json["tracks"][0]["instrument"]["category"], "Drums");
        assert_eq!(json["tracks"][1]["pattern"][1]["pitch"], 43.0);
        assert_eq!(demo_song().bar_duration(), 2.0);
    }
}
