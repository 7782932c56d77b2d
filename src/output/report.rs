//! Report structures wrapping match results for presentation

use crate::processing::analyzer::MatchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single job/resume comparison ready for output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Final score as a percentage (0-100)
    pub score_percentage: u8,

    /// One-line verdict derived from the score and the must-have gate
    pub verdict: String,

    pub result: MatchResult,

    pub metadata: ReportMetadata,
}

/// Report metadata and generation info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub reference_year: i32,
    pub job_source: String,
    pub version: String,
}

impl ReportMetadata {
    pub fn new(job_source: impl Into<String>, reference_year: i32, processing_time_ms: u64) -> Self {
        Self {
            generated_at: Utc::now(),
            processing_time_ms,
            reference_year,
            job_source: job_source.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Resumes ranked against one job posting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub rankings: Vec<RankedMatch>,
    pub summary: BatchSummary,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatch {
    /// 1-based position after sorting
    pub rank: usize,
    pub score_percentage: u8,
    pub verdict: String,
    pub result: MatchResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub count: usize,
    pub mean_score: f32,
    /// Resumes capped by a missing must-have
    pub gated_count: usize,
    pub best_cv_id: Option<String>,
}

impl MatchReport {
    pub fn new(result: MatchResult, metadata: ReportMetadata) -> Self {
        Self {
            score_percentage: score_percentage(result.score),
            verdict: verdict(&result),
            result,
            metadata,
        }
    }
}

impl BatchReport {
    /// Rank by descending score; ties keep their input order
    pub fn from_results(results: Vec<MatchResult>, metadata: ReportMetadata) -> Self {
        let count = results.len();
        let mean_score = if count == 0 {
            0.0
        } else {
            results.iter().map(|r| r.score).sum::<f32>() / count as f32
        };
        let gated_count = results.iter().filter(|r| !r.must_haves_satisfied()).count();

        let mut sorted = results;
        sorted.sort_by(|a, b| b.score.total_cmp(&a.score));

        let rankings: Vec<RankedMatch> = sorted
            .into_iter()
            .enumerate()
            .map(|(position, result)| RankedMatch {
                rank: position + 1,
                score_percentage: score_percentage(result.score),
                verdict: verdict(&result),
                result,
            })
            .collect();

        let summary = BatchSummary {
            count,
            mean_score,
            gated_count,
            best_cv_id: rankings.first().map(|r| r.result.cv_id.clone()),
        };

        Self {
            rankings,
            summary,
            metadata,
        }
    }
}

pub fn score_percentage(score: f32) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}

pub fn verdict(result: &MatchResult) -> String {
    if !result.must_haves_satisfied() {
        return format!(
            "Missing must-haves: {}",
            result.explanation.missing_must_haves.join(", ")
        );
    }

    match score_percentage(result.score) {
        80..=100 => "Strong match",
        65..=79 => "Good match",
        45..=64 => "Partial match",
        25..=44 => "Weak match",
        _ => "Poor match",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::analyzer::ScoreBreakdown;
    use crate::processing::explanation::Explanation;

    fn result(id: &str, score: f32, missing: &[&str]) -> MatchResult {
        MatchResult {
            cv_id: id.to_string(),
            cv_name: format!("{}.txt", id),
            score,
            explanation: Explanation {
                missing_must_haves: missing.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            breakdown: ScoreBreakdown {
                calibrated: score,
                must_haves_satisfied: missing.is_empty(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_batch_ranking_is_stable() {
        let results = vec![
            result("a", 0.4, &[]),
            result("b", 0.9, &[]),
            result("c", 0.4, &[]),
            result("d", 0.3, &["AWS"]),
        ];
        let report = BatchReport::from_results(results, ReportMetadata::new("job.txt", 2025, 0));

        let order: Vec<&str> = report.rankings.iter().map(|r| r.result.cv_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
        assert_eq!(report.rankings[0].rank, 1);
        assert_eq!(report.summary.count, 4);
        assert_eq!(report.summary.gated_count, 1);
        assert_eq!(report.summary.best_cv_id.as_deref(), Some("b"));
        assert!((report.summary.mean_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_batch_summary() {
        let report = BatchReport::from_results(Vec::new(), ReportMetadata::new("job.txt", 2025, 0));
        assert_eq!(report.summary.mean_score, 0.0);
        assert_eq!(report.summary.best_cv_id, None);
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(verdict(&result("a", 0.85, &[])), "Strong match");
        assert_eq!(verdict(&result("a", 0.5, &[])), "Partial match");
        assert_eq!(verdict(&result("a", 0.3, &["Rust", "AWS"])), "Missing must-haves: Rust, AWS");
        assert_eq!(score_percentage(0.456), 46);
    }
}
