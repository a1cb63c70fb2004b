//! Instrument voice library.
//!
//! Maps an instrument name (or `<kit>_<piece>` for drum kits) to the parameters one of the
//! three voice renderers needs. Lookups that miss return `None`; callers drop the note.

use std::collections::HashMap;

use crate::filter::FilterType;
use crate::waveform::WaveformType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEnvelope {
    pub attack: f64,
    pub decay: f64,
    pub start: f32,
    pub end: f32,
}

/// Linear rise then exponential fall; noise voices have no sustain stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseEnvelope {
    pub attack: f64,
    pub decay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoicePreset {
    Tonal {
        waveform: WaveformType,
        envelope: Adsr,
    },
    PitchedPercussive {
        waveform: WaveformType,
        envelope: Adsr,
        pitch: PitchEnvelope,
    },
    NoisePercussive {
        filter: FilterType,
        frequency: f32,
        envelope: NoiseEnvelope,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumPiece {
    Kick,
    Snare,
    HiHat,
}

impl DrumPiece {
    /// General MIDI drum map subset; anything else is not playable.
    pub fn from_pitch(pitch: f64) -> Option<DrumPiece> {
        if pitch == 36.0 {
            Some(DrumPiece::Kick)
        } else if pitch == 38.0 {
            Some(DrumPiece::Snare)
        } else if pitch == 42.0 {
            Some(DrumPiece::HiHat)
        } else {
            None
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            DrumPiece::Kick => "Kick",
            DrumPiece::Snare => "Snare",
            DrumPiece::HiHat => "Hi-hat",
        }
    }

    pub fn preset_key(&self, kit: &str) -> String {
        format!("{}_{}", kit, self.suffix())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoiceLibrary {
    presets: HashMap<String, VoicePreset>,
}

fn tonal(waveform: WaveformType, attack: f64, decay: f64, sustain: f32, release: f64) -> VoicePreset {
    VoicePreset::Tonal {
        waveform,
        envelope: Adsr { attack, decay, sustain, release },
    }
}

fn noise(filter: FilterType, frequency: f32, attack: f64, decay: f64) -> VoicePreset {
    VoicePreset::NoisePercussive {
        filter,
        frequency,
        envelope: NoiseEnvelope { attack, decay },
    }
}

fn kick(waveform: WaveformType, envelope: Adsr, pitch: PitchEnvelope) -> VoicePreset {
    VoicePreset::PitchedPercussive { waveform, envelope, pitch }
}

impl VoiceLibrary {
    pub fn new() -> Self {
        VoiceLibrary::default()
    }

    /// The factory library covering every instrument in [`crate::instrument`].
    pub fn builtin() -> Self {
        use FilterType::*;
        use WaveformType::*;

        let mut lib = VoiceLibrary::new();

        lib.insert("Electric Bass", tonal(Sine, 0.01, 0.3, 0.2, 0.2));
        lib.insert("Synth Bass", tonal(Sawtooth, 0.02, 0.4, 0.3, 0.3));
        lib.insert("Sub Bass", tonal(Sine, 0.01, 0.5, 0.4, 0.4));
        lib.insert("Grand Piano", tonal(Triangle, 0.01, 1.0, 0.1, 0.5));
        lib.insert("Electric Piano", tonal(Sine, 0.02, 0.8, 0.3, 0.4));
        lib.insert("Synth Pad", tonal(Triangle, 0.5, 1.0, 0.8, 1.0));
        lib.insert("Synth Lead", tonal(Square, 0.05, 0.5, 0.6, 0.3));
        lib.insert("Distorted Guitar", tonal(Sawtooth, 0.01, 0.7, 0.2, 0.2));
        lib.insert("Saxophone", tonal(Sawtooth, 0.1, 0.4, 0.5, 0.3));
        lib.insert("String Section", tonal(Sawtooth, 0.8, 1.5, 0.9, 1.2));
        lib.insert("Warm Pad", tonal(Triangle, 1.0, 1.2, 0.8, 1.5));
        lib.insert("Choir Aahs", tonal(Sine, 0.7, 1.1, 0.7, 1.0));
        lib.insert("Synth Arp", tonal(Square, 0.01, 0.2, 0.1, 0.1));
        lib.insert("Pizzicato Strings", tonal(Triangle, 0.01, 0.15, 0.05, 0.1));
        lib.insert("Plucked Synth", tonal(Sawtooth, 0.01, 0.25, 0.1, 0.2));

        lib.insert("Acoustic Kit_Kick", noise(LowPass, 120.0, 0.01, 0.2));
        lib.insert("Acoustic Kit_Snare", noise(BandPass, 1500.0, 0.01, 0.2));
        lib.insert("Acoustic Kit_Hi-hat", noise(HighPass, 7000.0, 0.01, 0.1));

        lib.insert("808 Kit_Kick", kick(
            Sine,
            Adsr { attack: 0.01, decay: 0.4, sustain: 0.01, release: 0.1 },
            PitchEnvelope { attack: 0.01, decay: 0.1, start: 120.0, end: 40.0 },
        ));
        lib.insert("808 Kit_Snare", noise(BandPass, 2000.0, 0.01, 0.15));
        lib.insert("808 Kit_Hi-hat", noise(HighPass, 8000.0, 0.01, 0.05));

        lib.insert("Techno Kit_Kick", kick(
            Square,
            Adsr { attack: 0.01, decay: 0.2, sustain: 0.01, release: 0.1 },
            PitchEnvelope { attack: 0.01, decay: 0.05, start: 100.0, end: 50.0 },
        ));
        lib.insert("Techno Kit_Snare", noise(BandPass, 1800.0, 0.01, 0.1));
        lib.insert("Techno Kit_Hi-hat", noise(HighPass, 9000.0, 0.01, 0.15));

        lib
    }

    pub fn insert(&mut self, key: &str, preset: VoicePreset) {
        self.presets.insert(key.to_string(), preset);
    }

    pub fn lookup(&self, key: &str) -> Option<&VoicePreset> {
        self.presets.get(key)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
