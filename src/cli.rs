//! CLI interface for the job matcher

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "job-matcher")]
#[command(about = "Hybrid job posting to resume matching")]
#[command(long_about = "Score resumes against a job posting using BM25, optional embeddings, section-aware weighting and must-have gating")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match one resume against a job posting
    Match {
        /// Path to job posting file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Precomputed job embedding (JSON array)
        #[arg(long)]
        job_embedding: Option<PathBuf>,

        /// Precomputed resume embedding (JSON array)
        #[arg(long)]
        resume_embedding: Option<PathBuf>,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Include the score breakdown
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Rank several resumes against a job posting
    Batch {
        /// Path to job posting file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Resume files (TXT, MD)
        #[arg(short, long, num_args = 1.., required = true)]
        resumes: Vec<PathBuf>,

        /// Maximum concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Include explanations for every resume
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Show the distinctive terms of a job posting
    Keywords {
        /// Path to job posting file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Background postings the terms are contrasted with
        #[arg(long, num_args = 0..)]
        corpus: Vec<PathBuf>,

        /// Number of terms to show
        #[arg(short, long, default_value_t = 15)]
        limit: usize,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, json", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch() {
        let cli = Cli::parse_from([
            "job-matcher",
            "batch",
            "--job",
            "job.txt",
            "--resumes",
            "a.txt",
            "b.md",
            "--workers",
            "3",
        ]);

        match cli.command {
            Commands::Batch { resumes, workers, .. } => {
                assert_eq!(resumes.len(), 2);
                assert_eq!(workers, Some(3));
            }
            _ => panic!("expected batch command"),
        }
    }

    #[test]
    fn test_parse_output_format() {
        assert_eq!(parse_output_format("JSON"), Ok(OutputFormat::Json));
        assert!(parse_output_format("pdf").is_err());
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("job.MD"), &["txt", "md"]).is_ok());
        assert!(validate_file_extension(Path::new("cv.pdf"), &["txt", "md"]).is_err());
        assert!(validate_file_extension(Path::new("README"), &["txt"]).is_err());
    }
}
