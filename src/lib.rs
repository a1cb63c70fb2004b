//! songsmith: a look-ahead loop scheduler and procedural synthesizer for generated songs.

pub mod error;
pub mod utils;
pub mod waveform;
pub mod automation;
pub mod filter;
pub mod instrument;
pub mod voices;
pub mod graph;
pub mod context;
pub mod render;
pub mod song;
pub mod scheduler;
pub mod history;
pub mod generation;
pub mod presets;
pub mod config;
pub mod session;

pub use error::ComposerError;
pub use waveform::WaveformType;
pub use filter::FilterType;
pub use instrument::{Instrument, InstrumentCategory};
pub use voices::{Adsr, DrumPiece, NoiseEnvelope, PitchEnvelope, VoiceLibrary, VoicePreset};
pub use graph::{Mixer, VoiceKind, VoiceNode};
pub use context::{AudioBackend, CpalBackend, CpalContext, OfflineBackend, OfflineContext, OutputContext};
pub use song::{Note, Song, Track};
pub use scheduler::{Scheduler, SchedulerState};
pub use history::History;
pub use generation::{generate_song, parse_response, GenerationRequest, SongModel, VocalStyle};
pub use presets::{PresetStore, UserPreset};
pub use config::{ComposerConfig, SchedulerConfig};
pub use session::Composer;
