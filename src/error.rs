use std::fmt;

impl std::error::Error for ComposerError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ComposerError {
    ParseError(String),
    GenerationError(String),
    AudioError(String),
    InvalidInstrument(String),
    PresetError(String),
}

impl fmt::Display for ComposerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ComposerError::ParseError(msg) => write!(f, "Parsing Error: {}", msg),
            ComposerError::GenerationError(msg) => write!(f, "Generation Error: {}", msg),
            ComposerError::AudioError(msg) => write!(f, "Audio Error: {}", msg),
            ComposerError::InvalidInstrument(msg) => write!(f, "Invalid Instrument Error: {}", msg),
            ComposerError::PresetError(msg) => write!(f, "Preset Error: {}", msg),
        }
    }
}

impl From<serde_json::Error> for ComposerError {
    fn from(e: serde_json::Error) -> Self {
        ComposerError::ParseError(e.to_string())
    }
}

impl From<std::io::Error> for ComposerError {
    fn from(e: std::io::Error) -> Self {
        ComposerError::PresetError(e.to_string())
    }
}
