use serde::{Deserialize, Serialize};

/// Periodic oscillator shapes available to tonal and pitched-percussive voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveformType {
    pub fn generate_sample(&self, phase: f32) -> f32 { // Phase should be in the range [0.0, 1.0)
        match self {
            WaveformType::Sine => (phase * std::f32::consts::TAU).sin(),
            WaveformType::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            WaveformType::Sawtooth => phase * 2.0 - 1.0,
            WaveformType::Triangle => {
                if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_hit_their_extremes() {
        assert_eq!(WaveformType::Square.generate_sample(0.25), 1.0);
        assert_eq!(WaveformType::Square.generate_sample(0.75), -1.0);
        assert_eq!(WaveformType::Triangle.generate_sample(0.0), -1.0);
        assert_eq!(WaveformType::Triangle.generate_sample(0.5), 1.0);
        assert_eq!(WaveformType::Sawtooth.generate_sample(0.0), -1.0);
        assert!((WaveformType::Sine.generate_sample(0.25) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn names_match_oscillator_types() {
        let w: WaveformType = serde_json::from_str("\"sawtooth\"").unwrap();
        assert_eq!(w, WaveformType::Sawtooth);
    }
}
