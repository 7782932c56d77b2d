//! Job matcher: hybrid job posting to resume scoring tool

use clap::Parser;
use job_matcher::cli::{self, Cli, Commands, ConfigAction};
use job_matcher::config::{Config, OutputFormat};
use job_matcher::error::{JobMatcherError, Result};
use job_matcher::input::InputManager;
use job_matcher::output::formatter::{formatter_for, OutputFormatter};
use job_matcher::output::report::{BatchReport, MatchReport, ReportMetadata};
use job_matcher::processing::analyzer::Matcher;
use job_matcher::processing::batch::BatchMatcher;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if path.exists() => Config::load_from(path),
        Some(path) => {
            info!("No configuration at {}, using defaults", path.display());
            Ok(Config::default())
        }
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Match {
            job,
            resume,
            job_embedding,
            resume_embedding,
            output,
            detailed,
            save,
        } => {
            validate_document(&job, "Job posting")?;
            validate_document(&resume, "Resume")?;
            let format = resolve_format(output.as_deref(), &config)?;
            let start = Instant::now();

            let matcher = Matcher::new(config.matching.clone())?;
            let mut input_manager = InputManager::new();
            let job_doc = input_manager.load_job(&job, job_embedding.as_deref()).await?;
            let cv = input_manager
                .load_resume(&resume, &matcher, resume_embedding.as_deref())
                .await?;

            info!("Matching {} against {}", resume.display(), job.display());
            let result = matcher.match_documents(&job_doc, &cv);
            let report = MatchReport::new(
                result,
                ReportMetadata::new(
                    job.display().to_string(),
                    matcher.reference_year(),
                    start.elapsed().as_millis() as u64,
                ),
            );

            let formatter = formatter(format, &config, detailed);
            emit(&formatter.format_match(&report)?, save.as_deref())?;
        }

        Commands::Batch {
            job,
            resumes,
            workers,
            output,
            detailed,
            save,
        } => {
            validate_document(&job, "Job posting")?;
            for resume in &resumes {
                validate_document(resume, "Resume")?;
            }
            let format = resolve_format(output.as_deref(), &config)?;
            let start = Instant::now();

            let matcher = Arc::new(Matcher::new(config.matching.clone())?);
            let mut input_manager = InputManager::new();
            let job_doc = input_manager.load_job(&job, None).await?;
            let mut cvs = Vec::with_capacity(resumes.len());
            for resume in &resumes {
                cvs.push(input_manager.load_resume(resume, &matcher, None).await?);
            }

            let workers = workers.unwrap_or(config.batch.max_workers);
            let results = BatchMatcher::new(Arc::clone(&matcher), workers)
                .run(job_doc, cvs)
                .await?;
            let report = BatchReport::from_results(
                results,
                ReportMetadata::new(
                    job.display().to_string(),
                    matcher.reference_year(),
                    start.elapsed().as_millis() as u64,
                ),
            );
            info!(
                "Ranked {} resumes, {} gated by must-haves",
                report.summary.count, report.summary.gated_count
            );

            let formatter = formatter(format, &config, detailed);
            emit(&formatter.format_batch(&report)?, save.as_deref())?;
        }

        Commands::Keywords {
            job,
            corpus,
            limit,
            output,
        } => {
            validate_document(&job, "Job posting")?;
            let format = resolve_format(output.as_deref(), &config)?;

            let matcher = Matcher::new(config.matching.clone())?;
            let mut input_manager = InputManager::new();
            let job_text = input_manager.read_text(&job).await?;
            let mut corpus_texts = Vec::with_capacity(corpus.len());
            for path in &corpus {
                validate_document(path, "Corpus posting")?;
                corpus_texts.push(input_manager.read_text(path).await?);
            }
            let corpus_refs: Vec<&str> = corpus_texts.iter().map(String::as_str).collect();

            let keywords = matcher.mine_keywords(&job_text, &corpus_refs, limit);
            let formatter = formatter(format, &config, false);
            emit(&formatter.format_keywords(&keywords)?, None)?;
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let content = toml::to_string_pretty(&config).map_err(|e| {
                    JobMatcherError::Configuration(format!("Failed to serialize config: {}", e))
                })?;
                println!("⚙️  Current Configuration\n");
                println!("{}", content);
            }

            Some(ConfigAction::Reset) => {
                println!("🔄 Resetting configuration to defaults...");
                let path = config_path.unwrap_or_else(Config::config_path);
                Config::default().save_to(&path)?;
                println!("✅ Configuration reset: {}", path.display());
            }

            Some(ConfigAction::Path) => {
                let path = config_path.unwrap_or_else(Config::config_path);
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

fn validate_document(path: &Path, label: &str) -> Result<()> {
    cli::validate_file_extension(path, DOCUMENT_EXTENSIONS)
        .map_err(|e| JobMatcherError::InvalidInput(format!("{} file: {}", label, e)))
}

fn resolve_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(JobMatcherError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn formatter(format: OutputFormat, config: &Config, detailed: bool) -> Box<dyn OutputFormatter> {
    formatter_for(format, config.output.color_output, detailed || config.output.detailed)
}

fn emit(content: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            std::fs::write(path, content)?;
            info!("Saved output to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
