//! Matching engine combining lexical, semantic and section-aware scoring with must-have gating

use crate::config::MatchingConfig;
use crate::error::Result;
use crate::processing::bm25::{normalize_bm25, Bm25Scorer};
use crate::processing::calibration::ScoreCalibrator;
use crate::processing::document::{CvDocument, JobDocument, SectionParser};
use crate::processing::embeddings::{dense_similarity, is_valid_embedding};
use crate::processing::explanation::{Explanation, ExplanationBuilder};
use crate::processing::must_have::{MustHaveChecker, MustHaveExtractor, MustHaveReport, MustHaveSet};
use crate::processing::recency::RecencyDecay;
use crate::processing::section_scorer::{SectionAggregator, SectionScores};
use crate::processing::text_processor::TextProcessor;
use crate::processing::vocabulary::TechVocabulary;
use serde::{Deserialize, Serialize};

/// Document ids inside the per-call index
const JOB_DOC: usize = 0;
const CV_DOC: usize = 1;

/// Scores job postings against resumes.
///
/// Holds only immutable configuration and compiled pattern tables, so one
/// instance can be shared across threads. Every call builds its own index.
pub struct Matcher {
    processor: TextProcessor,
    vocabulary: TechVocabulary,
    section_parser: SectionParser,
    extractor: MustHaveExtractor,
    checker: MustHaveChecker,
    recency: RecencyDecay,
    calibrator: ScoreCalibrator,
    config: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub cv_id: String,
    pub cv_name: String,
    /// Final calibrated score in [0, 1]
    pub score: f32,
    pub explanation: Explanation,
    pub breakdown: ScoreBreakdown,
}

impl MatchResult {
    pub fn must_haves_satisfied(&self) -> bool {
        self.breakdown.must_haves_satisfied
    }
}

/// Component scores behind a [`MatchResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub sparse_raw: f32,
    pub sparse: f32,
    pub dense: f32,
    pub dense_available: bool,
    pub section: SectionScores,
    pub blended: f32,
    pub calibrated: f32,
    pub must_haves_satisfied: bool,
}

impl Default for ScoreBreakdown {
    fn default() -> Self {
        Self {
            sparse_raw: 0.0,
            sparse: 0.0,
            dense: 0.0,
            dense_available: false,
            section: SectionScores::default(),
            blended: 0.0,
            calibrated: 0.0,
            must_haves_satisfied: true,
        }
    }
}

impl Matcher {
    /// Matcher evaluating recency against the current year
    pub fn new(config: MatchingConfig) -> Result<Self> {
        Self::build(config, RecencyDecay::new()?)
    }

    /// Matcher with a fixed reference year for recency decay
    pub fn with_reference_year(config: MatchingConfig, reference_year: i32) -> Result<Self> {
        Self::build(config, RecencyDecay::with_reference_year(reference_year)?)
    }

    fn build(config: MatchingConfig, recency: RecencyDecay) -> Result<Self> {
        config.validate()?;

        let matcher = Self {
            processor: TextProcessor::new(),
            vocabulary: TechVocabulary::new()?,
            section_parser: SectionParser::new()?,
            extractor: MustHaveExtractor::new()?,
            checker: MustHaveChecker::new()?,
            recency,
            calibrator: ScoreCalibrator::new(config.calibration.clone()),
            config,
        };
        log::debug!(
            "Matcher ready: {} curated terms, reference year {}",
            matcher.vocabulary.term_count(),
            matcher.recency.reference_year()
        );
        Ok(matcher)
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn reference_year(&self) -> i32 {
        self.recency.reference_year()
    }

    pub fn extract_must_haves(&self, job_text: &str) -> MustHaveSet {
        self.extractor.extract(job_text)
    }

    pub fn check_must_haves(&self, must_haves: &MustHaveSet, cv: &CvDocument) -> MustHaveReport {
        self.checker.check(must_haves, cv)
    }

    /// Build a resume from plain text using the section parser
    pub fn parse_cv(&self, id: &str, name: &str, text: &str) -> CvDocument {
        CvDocument::from_text(id, name, text, &self.section_parser)
    }

    /// Distinctive terms of a job posting relative to a background corpus
    pub fn mine_keywords(&self, job_text: &str, corpus: &[&str], limit: usize) -> Vec<(String, f32)> {
        self.scorer().mine_keywords(job_text, corpus, limit)
    }

    /// Match a job posting against one resume, extracting must-haves from the posting
    pub fn match_documents(&self, job: &JobDocument, cv: &CvDocument) -> MatchResult {
        let must_haves = self.extract_must_haves(&job.text);
        self.match_job_to_cv(
            &job.text,
            cv,
            &must_haves,
            job.embedding.as_deref(),
            cv.embedding.as_deref(),
        )
    }

    /// Score one (job, resume) pair.
    ///
    /// Identical inputs always produce an identical result. A blank posting or
    /// resume scores 0 with an empty explanation.
    pub fn match_job_to_cv(
        &self,
        job_text: &str,
        cv: &CvDocument,
        must_haves: &MustHaveSet,
        job_embedding: Option<&[f32]>,
        cv_embedding: Option<&[f32]>,
    ) -> MatchResult {
        if job_text.trim().is_empty() || cv.is_blank() {
            log::debug!("Blank job or resume '{}', scoring 0", cv.id);
            return MatchResult {
                cv_id: cv.id.clone(),
                cv_name: cv.name.clone(),
                score: 0.0,
                explanation: Explanation::default(),
                breakdown: ScoreBreakdown::default(),
            };
        }

        let report = self.checker.check(must_haves, cv);

        let scorer = self.scorer();
        let cv_text = cv.searchable_text();
        let index = scorer.index(&[job_text, cv_text.as_str()]);
        let sparse_raw = index.score_terms(&scorer.query_terms(job_text), CV_DOC);
        let sparse = normalize_bm25(sparse_raw);

        let dense = dense_similarity(job_embedding, cv_embedding);
        let dense_available = job_embedding.map_or(false, is_valid_embedding)
            && cv_embedding.map_or(false, is_valid_embedding)
            && job_embedding.map(<[f32]>::len) == cv_embedding.map(<[f32]>::len);

        let section = SectionAggregator::new(&scorer, &self.recency, &self.config.sections)
            .score(job_text, &cv.sections);

        let weights = &self.config.blend;
        let blended =
            (weights.dense * dense + weights.sparse * sparse + weights.section * section.score).clamp(0.0, 1.0);
        let gated = self.calibrator.gate(blended, report.satisfied);
        let calibrated = self.calibrator.calibrate(gated, report.satisfied);

        log::debug!(
            "Match '{}': sparse {:.4} (raw {:.3}), dense {:.4}, section {:.4}, blended {:.4}, final {:.4}, missing {:?}",
            cv.id,
            sparse,
            sparse_raw,
            dense,
            section.score,
            blended,
            calibrated,
            report.missing
        );

        let explanation = ExplanationBuilder::new(&self.processor, &scorer, &self.config.explanation).build(
            &index,
            JOB_DOC,
            CV_DOC,
            job_text,
            &cv_text,
            report.missing,
        );

        MatchResult {
            cv_id: cv.id.clone(),
            cv_name: cv.name.clone(),
            score: calibrated,
            explanation,
            breakdown: ScoreBreakdown {
                sparse_raw,
                sparse,
                dense,
                dense_available,
                section,
                blended,
                calibrated,
                must_haves_satisfied: report.satisfied,
            },
        }
    }

    fn scorer(&self) -> Bm25Scorer<'_> {
        Bm25Scorer::new(&self.processor, &self.vocabulary, self.config.bm25.clone())
    }
}
