use std::path::PathBuf;
use std::time::Duration;

const PRESETS_ENV: &str = "SONGSMITH_PRESETS";
const MAX_PLAYBACK_ENV: &str = "SONGSMITH_MAX_PLAYBACK_SECS";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock cadence of scheduler ticks
    pub lookahead: Duration,
    /// How far past the output clock each tick commits notes, in seconds
    pub schedule_ahead: f64,
    /// Retract voices that have not started yet when playback stops
    pub cancel_pending_on_stop: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            lookahead: Duration::from_millis(25),
            schedule_ahead: 0.1,
            cancel_pending_on_stop: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub presets_path: PathBuf,
    /// Transport stops itself after this long
    pub max_playback: Duration,
    pub scheduler: SchedulerConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            presets_path: PathBuf::from(".songsmith").join("presets.json"),
            max_playback: Duration::from_secs(30),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl ComposerConfig {
    /// Defaults, with `SONGSMITH_PRESETS` and `SONGSMITH_MAX_PLAYBACK_SECS` applied when set.
    pub fn from_env() -> Self {
        let mut config = ComposerConfig::default();

        if let Ok(path) = std::env::var(PRESETS_ENV) {
            config.presets_path = PathBuf::from(path);
        }

        if let Ok(secs) = std::env::var(MAX_PLAYBACK_ENV) {
            match secs.trim().parse::<f64>() {
                Ok(s) if s.is_finite() && s > 0.0 => config.max_playback = Duration::from_secs_f64(s),
                _ => log::warn!("Ignoring invalid {}: {:?}", MAX_PLAYBACK_ENV, secs),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transport_timing() {
        let config = ComposerConfig::default();
        assert_eq!(config.scheduler.lookahead, Duration::from_millis(25));
        assert_eq!(config.scheduler.schedule_ahead, 0.1);
        assert!(!config.scheduler.cancel_pending_on_stop);
        assert_eq!(config.max_playback, Duration::from_secs(30));
        assert!(config.presets_path.ends_with("presets.json"));
    }
}
