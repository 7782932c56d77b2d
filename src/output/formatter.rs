//! Output formatters for console and JSON presentation

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::{BatchReport, MatchReport};
use crate::processing::analyzer::MatchResult;
use colored::{Color, Colorize};
use serde::Serialize;

/// Trait for formatting reports
pub trait OutputFormatter {
    fn format_match(&self, report: &MatchReport) -> Result<String>;
    fn format_batch(&self, report: &BatchReport) -> Result<String>;
    fn format_keywords(&self, keywords: &[(String, f32)]) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Formatter for the configured output format
pub fn formatter_for(format: OutputFormat, use_colors: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };
        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, percentage: u8, satisfied: bool) -> String {
        let (badge, color) = match (satisfied, percentage) {
            (false, _) => ("GATED", Color::BrightRed),
            (true, 80..=100) => ("STRONG", Color::Green),
            (true, 65..=79) => ("GOOD", Color::BrightGreen),
            (true, 45..=64) => ("PARTIAL", Color::Yellow),
            (true, 25..=44) => ("WEAK", Color::Red),
            (true, _) => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_result_body(&self, result: &MatchResult) -> String {
        let mut output = String::new();
        let explanation = &result.explanation;

        if !explanation.missing_must_haves.is_empty() {
            output.push_str(&self.format_header("Missing Must-Haves", 3));
            for missing in &explanation.missing_must_haves {
                output.push_str(&format!("  ✗ {}\n", self.colorize(missing, Color::Red)));
            }
        }

        if !explanation.matched_keywords.is_empty() {
            output.push_str(&self.format_header("Matched Keywords", 3));
            output.push_str(&format!(
                "  {}\n",
                self.colorize(&explanation.matched_keywords.join(", "), Color::Green)
            ));
        }

        if !explanation.top_sentences.is_empty() {
            output.push_str(&self.format_header("Most Relevant Resume Lines", 3));
            for sentence in &explanation.top_sentences {
                output.push_str(&format!("  • {} ({:.2})\n", sentence.text, sentence.score));
            }
        }

        if self.detailed {
            let breakdown = &result.breakdown;
            let section = &breakdown.section;
            output.push_str(&self.format_header("Score Breakdown", 3));
            output.push_str(&format!(
                "  Lexical (BM25): {:.1}% (raw {:.2})\n",
                breakdown.sparse * 100.0,
                breakdown.sparse_raw
            ));
            if breakdown.dense_available {
                output.push_str(&format!("  Semantic: {:.1}%\n", breakdown.dense * 100.0));
            } else {
                output.push_str("  Semantic: n/a (no embeddings)\n");
            }
            output.push_str(&format!("  Sections: {:.1}%\n", section.score * 100.0));
            for (label, score) in [
                ("experience", section.experience),
                ("skills", section.skills),
                ("projects", section.projects),
                ("education/location", section.education_location),
            ] {
                if let Some(score) = score {
                    output.push_str(&format!("    {}: {:.1}%\n", label, score * 100.0));
                }
            }
            output.push_str(&format!("  Recency factor: {:.2}\n", section.recency));
            output.push_str(&format!(
                "  Blended: {:.1}% → calibrated {:.1}%\n",
                breakdown.blended * 100.0,
                breakdown.calibrated * 100.0
            ));
        }

        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_match(&self, report: &MatchReport) -> Result<String> {
        let mut output = String::new();
        let result = &report.result;

        output.push_str(&self.format_header("JOB MATCH", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));
        output.push_str(&format!("Job: {} | Resume: {}\n", report.metadata.job_source, result.cv_name));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Score: {}% {}\n",
            report.score_percentage,
            self.format_score_badge(report.score_percentage, result.must_haves_satisfied())
        ));
        output.push_str(&format!("Verdict: {}\n", self.colorize(&report.verdict, Color::Cyan)));

        output.push_str(&self.format_result_body(result));
        Ok(output)
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME RANKING", 1));
        output.push_str(&format!(
            "Job: {} | Generated: {} | Processing time: {}ms\n",
            report.metadata.job_source,
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Resumes: {} | Mean score: {:.1}% | Gated by must-haves: {}\n",
            report.summary.count,
            report.summary.mean_score * 100.0,
            report.summary.gated_count
        ));

        output.push_str(&self.format_header("Ranking", 2));
        for ranked in &report.rankings {
            output.push_str(&format!(
                "{:>3}. {:<30} {:>3}% {} {}\n",
                ranked.rank,
                ranked.result.cv_name,
                ranked.score_percentage,
                self.format_score_badge(ranked.score_percentage, ranked.result.must_haves_satisfied()),
                self.colorize(&ranked.verdict, Color::Cyan)
            ));
            if self.detailed {
                output.push_str(&self.format_result_body(&ranked.result));
            }
        }

        Ok(output)
    }

    fn format_keywords(&self, keywords: &[(String, f32)]) -> Result<String> {
        let mut output = self.format_header("Distinctive Job Keywords", 1);
        if keywords.is_empty() {
            output.push_str("  (none)\n");
        }
        for (rank, (term, score)) in keywords.iter().enumerate() {
            output.push_str(&format!(
                "{:>3}. {:<24} {:.3}\n",
                rank + 1,
                self.colorize(term, Color::Green),
                score
            ));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

#[derive(Serialize)]
struct KeywordEntry<'a> {
    term: &'a str,
    score: f32,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_match(&self, report: &MatchReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_batch(&self, report: &BatchReport) -> Result<String> {
        self.to_json(report)
    }

    fn format_keywords(&self, keywords: &[(String, f32)]) -> Result<String> {
        let entries: Vec<KeywordEntry> = keywords
            .iter()
            .map(|(term, score)| KeywordEntry { term, score: *score })
            .collect();
        self.to_json(&entries)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::ReportMetadata;
    use crate::processing::analyzer::ScoreBreakdown;
    use crate::processing::explanation::{Explanation, TopSentence};

    fn sample_result() -> MatchResult {
        MatchResult {
            cv_id: "alice".to_string(),
            cv_name: "alice.txt".to_string(),
            score: 0.31,
            explanation: Explanation {
                matched_keywords: vec!["python".to_string(), "postgresql".to_string()],
                missing_must_haves: vec!["AWS".to_string()],
                top_sentences: vec![TopSentence {
                    text: "Built Python services on PostgreSQL.".to_string(),
                    score: 1.25,
                }],
            },
            breakdown: ScoreBreakdown {
                must_haves_satisfied: false,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_console_match_without_colors() {
        let formatter = ConsoleFormatter::new(false, true);
        let report = MatchReport::new(sample_result(), ReportMetadata::new("job.txt", 2025, 12));

        let output = formatter.format_match(&report).unwrap();

        assert!(output.contains("Score: 31% [GATED]"));
        assert!(output.contains("✗ AWS"));
        assert!(output.contains("python, postgresql"));
        assert!(output.contains("Built Python services on PostgreSQL. (1.25)"));
        assert!(output.contains("Semantic: n/a"));
    }

    #[test]
    fn test_json_match_round_trips() {
        let formatter = JsonFormatter::new(false);
        let report = MatchReport::new(sample_result(), ReportMetadata::new("job.txt", 2025, 12));

        let json = formatter.format_match(&report).unwrap();
        let parsed: MatchReport = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.result, report.result);
        assert_eq!(formatter.supports_format(), OutputFormat::Json);
    }

    #[test]
    fn test_keywords_output() {
        let keywords = vec![("kafka".to_string(), 1.5), ("rust".to_string(), 1.2)];

        let console = ConsoleFormatter::new(false, false).format_keywords(&keywords).unwrap();
        assert!(console.contains("1. kafka"));

        let json = JsonFormatter::new(false).format_keywords(&keywords).unwrap();
        assert_eq!(json, r#"[{"term":"kafka","score":1.5},{"term":"rust","score":1.2}]"#);
    }

    #[test]
    fn test_formatter_for() {
        assert_eq!(formatter_for(OutputFormat::Console, false, false).supports_format(), OutputFormat::Console);
        assert_eq!(formatter_for(OutputFormat::Json, false, false).supports_format(), OutputFormat::Json);
    }
}
