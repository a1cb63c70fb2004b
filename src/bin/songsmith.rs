//! Play a song loop through the default output device
//!
//! Usage: songsmith <song.json> [seconds]

use std::env;
use std::fs;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use songsmith::{parse_response, ComposerConfig, ComposerError, CpalBackend, Scheduler, SchedulerState, Song, VoiceLibrary};

const USAGE: &str = "Usage: songsmith <song.json> [seconds]

Play the one-bar loop of a song through the default audio output.

Arguments:
  song.json     A saved song, or a raw reply from the generation model
  seconds       How long to play (optional, defaults to 8)

Environment:
  RUST_LOG                     Log filter (defaults to info)
";

const DEFAULT_SECONDS: f64 = 8.0;

fn load_song(content: &str) -> Result<Song, ComposerError> {
    // Saved songs carry full instruments; model replies only carry names
    match serde_json::from_str::<Song>(content) {
        Ok(song) => Ok(song),
        Err(_) => parse_response(content),
    }
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    let input_path = &args[1];
    let seconds = match args.get(2).map(|s| s.parse::<f64>()) {
        None => DEFAULT_SECONDS,
        Some(Ok(s)) if s.is_finite() && s > 0.0 => s,
        Some(_) => {
            eprintln!("Invalid duration: {}", args[2]);
            process::exit(1);
        }
    };

    let content = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let song = match load_song(&content) {
        Ok(song) => song,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    println!("{} ({}, {}) at {} BPM", song.title, song.genre, song.mood, song.tempo);
    for track in &song.tracks {
        println!("  {:<8} {:<18} {} notes", track.role.as_str(), track.instrument.name, track.pattern.len());
    }

    let config = ComposerConfig::from_env();
    let mut scheduler = Scheduler::new(CpalBackend, Arc::new(VoiceLibrary::builtin()), config.scheduler);
    if scheduler.start(Some(Arc::new(song))) != SchedulerState::Running {
        eprintln!("Could not start playback");
        process::exit(1);
    }

    scheduler.run_for(Duration::from_secs_f64(seconds));
    println!("Played {} bars", scheduler.bars_scheduled());
    scheduler.stop();
}
