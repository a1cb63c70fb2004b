/// Beats in one bar; patterns always cover a single 4/4 bar.
pub const BEATS_PER_BAR: f64 = 4.0;

/// Equal-tempered frequency of a MIDI note number, A4 (69) = 440 Hz.
pub fn midi_to_freq(pitch: f64) -> f64 {
    440.0 * 2.0_f64.powf((pitch - 69.0) / 12.0)
}

/// Length of one bar in seconds at `tempo` beats per minute.
pub fn bar_duration(tempo: f64) -> f64 {
    (60.0 / tempo) * BEATS_PER_BAR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_reference_pitches() {
        assert_eq!(midi_to_freq(69.0), 440.0);
        assert!((midi_to_freq(81.0) - 880.0).abs() < 1e-9);
        assert!((midi_to_freq(60.0) - 261.625_565).abs() < 1e-5);
    }

    #[test]
    fn bar_at_120_bpm_is_two_seconds() {
        assert_eq!(bar_duration(120.0), 2.0);
        assert_eq!(bar_duration(60.0), 4.0);
    }
}
