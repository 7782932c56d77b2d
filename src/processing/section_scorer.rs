//! Section-aware scoring of a job posting against resume sections

use crate::config::SectionWeights;
use crate::processing::bm25::{normalize_bm25, Bm25Scorer};
use crate::processing::document::Sections;
use crate::processing::recency::RecencyDecay;
use serde::{Deserialize, Serialize};

/// Per-bucket normalized scores; `None` marks an empty bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionScores {
    pub experience: Option<f32>,
    pub skills: Option<f32>,
    pub projects: Option<f32>,
    pub education_location: Option<f32>,
    pub recency: f32,
    pub score: f32,
}

pub struct SectionAggregator<'a> {
    scorer: &'a Bm25Scorer<'a>,
    recency: &'a RecencyDecay,
    weights: &'a SectionWeights,
}

impl<'a> SectionAggregator<'a> {
    pub fn new(scorer: &'a Bm25Scorer<'a>, recency: &'a RecencyDecay, weights: &'a SectionWeights) -> Self {
        Self {
            scorer,
            recency,
            weights,
        }
    }

    /// Weighted mean over the non-empty buckets only
    pub fn score(&self, job_text: &str, sections: &Sections) -> SectionScores {
        let recency = self.recency.factor(&sections.experience);

        let experience = self
            .bucket_score(job_text, &sections.experience)
            .map(|score| (score * recency).clamp(0.0, 1.0));
        let skills = self
            .bucket_score(job_text, &sections.skills)
            .map(|score| (score * self.weights.skills_boost).min(1.0));
        let projects = self.bucket_score(job_text, &sections.projects);
        let education_location = self.bucket_score(job_text, &sections.education_location());

        let weighted = [
            (experience, self.weights.experience),
            (skills, self.weights.skills),
            (projects, self.weights.projects),
            (education_location, self.weights.education_location),
        ];

        let (numerator, denominator) = weighted
            .iter()
            .filter_map(|(score, weight)| score.map(|s| (s * weight, *weight)))
            .fold((0.0f32, 0.0f32), |(num, den), (s, w)| (num + s, den + w));

        let score = if denominator > 0.0 {
            (numerator / denominator).clamp(0.0, 1.0)
        } else {
            0.0
        };

        log::debug!(
            "Section scores: experience {:?}, skills {:?}, projects {:?}, education/location {:?}, recency {:.2} -> {:.4}",
            experience,
            skills,
            projects,
            education_location,
            recency,
            score
        );

        SectionScores {
            experience,
            skills,
            projects,
            education_location,
            recency,
            score,
        }
    }

    fn bucket_score(&self, job_text: &str, bucket: &str) -> Option<f32> {
        if bucket.trim().is_empty() {
            return None;
        }
        Some(normalize_bm25(self.scorer.score_query(job_text, bucket)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bm25Config;
    use crate::processing::text_processor::TextProcessor;
    use crate::processing::vocabulary::TechVocabulary;

    const JOB: &str = "Backend engineer with Python, PostgreSQL and Docker experience building APIs";

    fn fixtures() -> (TextProcessor, TechVocabulary, RecencyDecay, SectionWeights) {
        (
            TextProcessor::new(),
            TechVocabulary::new().unwrap(),
            RecencyDecay::with_reference_year(2025).unwrap(),
            SectionWeights::default(),
        )
    }

    #[test]
    fn test_no_sections_scores_zero() {
        let (processor, vocabulary, recency, weights) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let aggregator = SectionAggregator::new(&scorer, &recency, &weights);

        let scores = aggregator.score(JOB, &Sections::default());

        assert_eq!(scores.score, 0.0);
        assert_eq!(scores.experience, None);
        assert_eq!(scores.recency, crate::processing::recency::NO_SECTION_FACTOR);
    }

    #[test]
    fn test_skills_only_gets_full_weight() {
        let (processor, vocabulary, recency, weights) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let aggregator = SectionAggregator::new(&scorer, &recency, &weights);
        let skills = "Python, Django, PostgreSQL, Docker";
        let sections = Sections {
            skills: skills.to_string(),
            ..Default::default()
        };

        let scores = aggregator.score(JOB, &sections);
        let expected = (normalize_bm25(scorer.score_query(JOB, skills)) * weights.skills_boost).min(1.0);

        assert!(expected > 0.0);
        assert_eq!(scores.skills, Some(expected));
        assert!((scores.score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_experience_discounted_by_recency() {
        let (processor, vocabulary, recency, weights) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let aggregator = SectionAggregator::new(&scorer, &recency, &weights);

        let fresh = Sections {
            experience: "2023 - present: Backend engineer, Python and PostgreSQL APIs".to_string(),
            ..Default::default()
        };
        let stale = Sections {
            experience: "2012 - 2014: Backend engineer, Python and PostgreSQL APIs".to_string(),
            ..Default::default()
        };

        let fresh_scores = aggregator.score(JOB, &fresh);
        let stale_scores = aggregator.score(JOB, &stale);

        assert_eq!(fresh_scores.recency, 1.0);
        assert_eq!(stale_scores.recency, 0.4);
        assert!(fresh_scores.score > stale_scores.score);
    }

    #[test]
    fn test_empty_buckets_excluded_from_denominator() {
        let (processor, vocabulary, recency, weights) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let aggregator = SectionAggregator::new(&scorer, &recency, &weights);
        let sections = Sections {
            skills: "Python, Docker".to_string(),
            projects: "Gardening blog".to_string(),
            ..Default::default()
        };

        let scores = aggregator.score(JOB, &sections);
        let skills = scores.skills.unwrap();
        let projects = scores.projects.unwrap();
        let expected = (skills * weights.skills + projects * weights.projects) / (weights.skills + weights.projects);

        assert_eq!(projects, 0.0);
        assert!((scores.score - expected).abs() < 1e-6);
    }
}
