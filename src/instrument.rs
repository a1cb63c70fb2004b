use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::ComposerError;

/// Track role; also the category an instrument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentCategory {
    Drums,
    Bass,
    Chords,
    Lead,
    Pads,
    Arp,
}

impl InstrumentCategory {
    pub const ALL: [InstrumentCategory; 6] = [
        InstrumentCategory::Drums,
        InstrumentCategory::Bass,
        InstrumentCategory::Chords,
        InstrumentCategory::Lead,
        InstrumentCategory::Pads,
        InstrumentCategory::Arp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentCategory::Drums => "Drums",
            InstrumentCategory::Bass => "Bass",
            InstrumentCategory::Chords => "Chords",
            InstrumentCategory::Lead => "Lead",
            InstrumentCategory::Pads => "Pads",
            InstrumentCategory::Arp => "Arp",
        }
    }
}

impl fmt::Display for InstrumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentCategory {
    type Err = ComposerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InstrumentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ComposerError::InvalidInstrument(format!("Unknown role: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub name: String,
    pub category: InstrumentCategory,
}

impl Instrument {
    pub fn new(name: &str, category: InstrumentCategory) -> Self {
        Instrument { name: name.to_string(), category }
    }
}

const DRUMS: [&str; 3] = ["Acoustic Kit", "808 Kit", "Techno Kit"];
const BASS: [&str; 3] = ["Electric Bass", "Synth Bass", "Sub Bass"];
const CHORDS: [&str; 3] = ["Grand Piano", "Electric Piano", "Synth Pad"];
const LEAD: [&str; 3] = ["Synth Lead", "Distorted Guitar", "Saxophone"];
const PADS: [&str; 3] = ["String Section", "Warm Pad", "Choir Aahs"];
const ARP: [&str; 3] = ["Synth Arp", "Pizzicato Strings", "Plucked Synth"];

/// Instrument names offered for a category, in library order.
pub fn instrument_names(category: InstrumentCategory) -> &'static [&'static str] {
    match category {
        InstrumentCategory::Drums => &DRUMS,
        InstrumentCategory::Bass => &BASS,
        InstrumentCategory::Chords => &CHORDS,
        InstrumentCategory::Lead => &LEAD,
        InstrumentCategory::Pads => &PADS,
        InstrumentCategory::Arp => &ARP,
    }
}

pub fn instruments_for(category: InstrumentCategory) -> Vec<Instrument> {
    instrument_names(category)
        .iter()
        .map(|name| Instrument::new(name, category))
        .collect()
}

pub fn find_instrument(category: InstrumentCategory, name: &str) -> Option<Instrument> {
    instrument_names(category)
        .iter()
        .find(|n| **n == name)
        .map(|n| Instrument::new(n, category))
}

/// First library entry of the category; the fallback for unknown model output.
pub fn default_instrument(category: InstrumentCategory) -> Instrument {
    Instrument::new(instrument_names(category)[0], category)
}
