//! Final score reshaping and must-have gating

use crate::config::CalibrationConfig;

pub struct ScoreCalibrator {
    config: CalibrationConfig,
}

impl ScoreCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Reshape a blended score. Non-finite input maps to 0.
    pub fn reshape(&self, blended: f32) -> f32 {
        if !blended.is_finite() {
            return 0.0;
        }

        let mut score = blended.clamp(0.0, 1.0);
        if score > self.config.threshold {
            score = score.powf(self.config.exponent);
        }
        if (self.config.good_band_low..=self.config.good_band_high).contains(&score) {
            score += self.config.good_band_boost;
        }
        score.clamp(0.0, 1.0)
    }

    /// Ceiling applied when a must-have is missing
    pub fn gate(&self, score: f32, must_haves_satisfied: bool) -> f32 {
        if must_haves_satisfied {
            score
        } else {
            score.min(self.config.must_have_cap)
        }
    }

    /// Reshape, then gate; the cap comes last so reshaping never lifts a
    /// gated score above it
    pub fn calibrate(&self, blended: f32, must_haves_satisfied: bool) -> f32 {
        self.gate(self.reshape(blended), must_haves_satisfied)
    }
}

impl Default for ScoreCalibrator {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}
