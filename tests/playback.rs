use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use songsmith::{
    parse_response, Composer, ComposerConfig, ComposerError, Instrument, InstrumentCategory,
    OfflineBackend, OfflineContext, Scheduler, SchedulerConfig, Song, SongModel, VoiceKind,
    VoiceLibrary,
};

const KICK_LOOP: &str = r#"{
    "title": "Four on the Floor",
    "genre": "House",
    "mood": "Driving",
    "lyrics": "Move",
    "tempo": 120,
    "tracks": [
        { "role": "Drums", "instrumentName": "808 Kit", "pattern": [
            { "time": 0, "duration": 0.25, "pitch": 36, "velocity": 1 }
        ] }
    ]
}"#;

const BAND: &str = r#"{
    "title": "Side Streets",
    "genre": "Funk",
    "mood": "Loose",
    "lyrics": "Walking down",
    "tempo": 104,
    "tracks": [
        { "role": "Drums", "instrumentName": "Acoustic Kit", "pattern": [
            { "time": 0, "duration": 0.1, "pitch": 37, "velocity": 1 },
            { "time": 0, "duration": 0.25, "pitch": 36, "velocity": 1 },
            { "time": 0.5, "duration": 0.25, "pitch": 38, "velocity": 0.9 }
        ] },
        { "role": "Bass", "instrumentName": "Electric Bass", "pattern": [
            { "time": 0, "duration": 0.25, "pitch": 40, "velocity": 0.8 },
            { "time": 0.5, "duration": 0.25, "pitch": 43, "velocity": 0.8 }
        ] },
        { "role": "Lead", "instrumentName": "Saxophone", "pattern": [
            { "time": 0.25, "duration": 0.5, "pitch": 71, "velocity": 0.7 }
        ] }
    ]
}"#;

struct Reply(&'static str);

impl SongModel for Reply {
    fn complete(&self, _prompt: &str, _schema: &Value) -> Result<String, ComposerError> {
        Ok(self.0.to_string())
    }
}

fn scheduler() -> Scheduler<OfflineBackend> {
    Scheduler::new(OfflineBackend::new(16_000.0), Arc::new(VoiceLibrary::builtin()), SchedulerConfig::default())
}

fn ctx(s: &mut Scheduler<OfflineBackend>) -> &mut OfflineContext {
    s.context_mut().unwrap()
}

fn play(s: &mut Scheduler<OfflineBackend>, seconds: f64) -> Vec<f32> {
    let mut out = Vec::new();
    for _ in 0..(seconds / 0.025).round() as usize {
        out.extend(ctx(s).render(0.025));
        s.tick();
    }
    out
}

#[test]
fn kick_at_120_bpm() {
    let song = parse_response(KICK_LOOP).unwrap();
    assert_eq!(song.bar_duration(), 2.0);

    let mut s = scheduler();
    s.start(Some(Arc::new(song)));
    play(&mut s, 4.0);

    let voices = ctx(&mut s).scheduled().to_vec();
    assert_eq!(voices.len(), 3);
    for (n, kick) in voices.iter().enumerate() {
        let bar_start = n as f64 * 2.0;
        assert_eq!(kick.kind, VoiceKind::PitchedPercussive);
        assert_eq!(kick.start, bar_start);
        assert_eq!(kick.stop, bar_start + 0.5);

        let freq = kick.frequency().unwrap();
        assert_eq!(freq.value_at(bar_start), 120.0);
        assert!((freq.value_at(bar_start + 0.11) - 40.0).abs() < 1e-3);
        assert!((freq.value_at(bar_start + 0.3) - 40.0).abs() < 1e-3);
    }
}

#[test]
fn long_playback_does_not_drift() {
    let song = parse_response(BAND).unwrap();
    let bar = song.bar_duration();

    let mut s = scheduler();
    s.start(Some(Arc::new(song)));
    play(&mut s, 30.0);

    let voices = ctx(&mut s).scheduled().to_vec();
    let per_bar = 5;
    let bars = voices.len() / per_bar;
    assert_eq!(voices.len() % per_bar, 0);
    assert_eq!(bars as u64, s.bars_scheduled());
    assert!(bars >= 13);

    for n in 0..bars {
        let group = &voices[n * per_bar..(n + 1) * per_bar];
        let bar_start = n as f64 * bar;
        assert!((group[0].start - bar_start).abs() < 1e-9);
        assert!((group[1].start - (bar_start + 0.5 * bar)).abs() < 1e-9);
        assert!((group[4].start - (bar_start + 0.25 * bar)).abs() < 1e-9);
        assert!((group[4].stop - (bar_start + 0.75 * bar + 0.1)).abs() < 1e-9);
    }
}

#[test]
fn unplayable_notes_are_silent_and_harmless() {
    let song = parse_response(BAND).unwrap();
    let mut s = scheduler();
    s.start(Some(Arc::new(song)));

    // pitch 37 is skipped: kick, snare, two bass notes, one sax note
    let kinds: Vec<VoiceKind> = ctx(&mut s).scheduled().iter().map(|v| v.kind).collect();
    assert_eq!(kinds, vec![
        VoiceKind::NoisePercussive,
        VoiceKind::NoisePercussive,
        VoiceKind::Tonal,
        VoiceKind::Tonal,
        VoiceKind::Tonal,
    ]);
}

#[test]
fn rendered_audio_is_bounded_and_audible() {
    let song = parse_response(BAND).unwrap();
    let mut s = scheduler();
    s.start(Some(Arc::new(song)));

    let audio = play(&mut s, 2.5);
    assert_eq!(audio.len(), 40_000);
    assert!(audio.iter().all(|x| x.abs() <= 1.0));
    assert!(audio.iter().any(|x| x.abs() > 0.01));
}

#[test]
fn swap_then_undo_redo_through_the_session() {
    let path = std::env::temp_dir()
        .join(format!("songsmith-it-{}", std::process::id()))
        .join("presets.json");
    let config = ComposerConfig { presets_path: path, ..Default::default() };
    let mut composer = Composer::new(OfflineBackend::new(8000.0), config);

    let original = composer.generate(&Reply(BAND)).unwrap();
    let lead = Instrument::new("Synth Lead", InstrumentCategory::Lead);
    let swapped = composer.change_instrument(2, lead.clone()).unwrap();

    let mut expected: Song = (*original).clone();
    expected.tracks[2].instrument = lead;
    assert_eq!(*swapped, expected);

    assert!(composer.undo());
    assert!(Arc::ptr_eq(composer.song().unwrap(), &original));
    assert!(composer.redo());
    assert!(Arc::ptr_eq(composer.song().unwrap(), &swapped));

    assert!(composer.play_at(Instant::now()));
    let ctx = composer.scheduler_mut().context_mut().unwrap();
    assert_eq!(ctx.scheduled().len(), 5);
}
