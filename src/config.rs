//! Configuration management for the job matcher
//!
//! The defaults below are the single canonical tuning of the engine. Every
//! numeric knob is a named constant so tests and documentation can refer to
//! it instead of repeating magic numbers.

use crate::error::{JobMatcherError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// BM25 term-frequency saturation.
pub const DEFAULT_K1: f32 = 1.5;
/// BM25 document-length normalization.
pub const DEFAULT_B: f32 = 0.75;
/// IDF multiplier for terms from the technical vocabulary.
pub const TECHNICAL_IDF_BOOST: f32 = 1.5;

pub const DENSE_WEIGHT: f32 = 0.35;
pub const SPARSE_WEIGHT: f32 = 0.30;
pub const SECTION_WEIGHT: f32 = 0.35;

pub const EXPERIENCE_WEIGHT: f32 = 0.45;
pub const SKILLS_WEIGHT: f32 = 0.30;
pub const PROJECTS_WEIGHT: f32 = 0.15;
pub const EDUCATION_LOCATION_WEIGHT: f32 = 0.10;
/// Multiplier applied to the skills bucket, result capped at 1.0.
pub const SKILLS_BOOST: f32 = 1.1;

pub const CALIBRATION_THRESHOLD: f32 = 0.1;
pub const CALIBRATION_EXPONENT: f32 = 0.8;
pub const GOOD_BAND_LOW: f32 = 0.4;
pub const GOOD_BAND_HIGH: f32 = 0.8;
pub const GOOD_BAND_BOOST: f32 = 0.05;
/// Ceiling for any match that misses a must-have.
pub const MUST_HAVE_CAP: f32 = 0.35;

pub const MAX_MATCHED_KEYWORDS: usize = 12;
pub const MAX_TOP_SENTENCES: usize = 3;
pub const MIN_SENTENCE_CHARS: usize = 20;
pub const MAX_SENTENCE_CHARS: usize = 150;

const WEIGHT_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub matching: MatchingConfig,
    pub embeddings: EmbeddingConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub bm25: Bm25Config,
    pub blend: BlendWeights,
    pub sections: SectionWeights,
    pub calibration: CalibrationConfig,
    pub explanation: ExplanationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
    pub technical_boost: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub dense: f32,
    pub sparse: f32,
    pub section: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionWeights {
    pub experience: f32,
    pub skills: f32,
    pub projects: f32,
    pub education_location: f32,
    pub skills_boost: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub threshold: f32,
    pub exponent: f32,
    pub good_band_low: f32,
    pub good_band_high: f32,
    pub good_band_boost: f32,
    pub must_have_cap: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationConfig {
    pub max_keywords: usize,
    pub max_sentences: usize,
    pub min_sentence_chars: usize,
    pub max_sentence_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub max_concurrent: usize,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_workers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            technical_boost: TECHNICAL_IDF_BOOST,
        }
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            dense: DENSE_WEIGHT,
            sparse: SPARSE_WEIGHT,
            section: SECTION_WEIGHT,
        }
    }
}

impl Default for SectionWeights {
    fn default() -> Self {
        Self {
            experience: EXPERIENCE_WEIGHT,
            skills: SKILLS_WEIGHT,
            projects: PROJECTS_WEIGHT,
            education_location: EDUCATION_LOCATION_WEIGHT,
            skills_boost: SKILLS_BOOST,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            threshold: CALIBRATION_THRESHOLD,
            exponent: CALIBRATION_EXPONENT,
            good_band_low: GOOD_BAND_LOW,
            good_band_high: GOOD_BAND_HIGH,
            good_band_boost: GOOD_BAND_BOOST,
            must_have_cap: MUST_HAVE_CAP,
        }
    }
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            max_keywords: MAX_MATCHED_KEYWORDS,
            max_sentences: MAX_TOP_SENTENCES,
            min_sentence_chars: MIN_SENTENCE_CHARS,
            max_sentence_chars: MAX_SENTENCE_CHARS,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout_ms: 5_000,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl MatchingConfig {
    /// Reject tunings that would break the [0,1] score contract
    pub fn validate(&self) -> Result<()> {
        let blend_sum = self.blend.dense + self.blend.sparse + self.blend.section;
        if (blend_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(JobMatcherError::Configuration(format!(
                "Blend weights must sum to 1.0, got {:.3}",
                blend_sum
            )));
        }

        let weights = [
            self.blend.dense,
            self.blend.sparse,
            self.blend.section,
            self.sections.experience,
            self.sections.skills,
            self.sections.projects,
            self.sections.education_location,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(JobMatcherError::Configuration(
                "Weights must be finite and non-negative".to_string(),
            ));
        }

        if !(self.bm25.k1 > 0.0) {
            return Err(JobMatcherError::Configuration(format!(
                "BM25 k1 must be positive, got {}",
                self.bm25.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(JobMatcherError::Configuration(format!(
                "BM25 b must be within [0, 1], got {}",
                self.bm25.b
            )));
        }
        if !(0.0..=1.0).contains(&self.calibration.must_have_cap) {
            return Err(JobMatcherError::Configuration(format!(
                "Must-have cap must be within [0, 1], got {}",
                self.calibration.must_have_cap
            )));
        }
        if !(self.calibration.exponent > 0.0) {
            return Err(JobMatcherError::Configuration(
                "Calibration exponent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.matching.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            JobMatcherError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("job-matcher")
            .join("config.toml")
    }
}
