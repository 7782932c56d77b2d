//! Parallel matching of one job posting against many resumes

use crate::error::{JobMatcherError, Result};
use crate::processing::analyzer::{MatchResult, Matcher};
use crate::processing::document::{CvDocument, JobDocument};
use crate::processing::embeddings::EmbeddingResolver;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shards (job, resume) pairs across a bounded worker pool
pub struct BatchMatcher {
    matcher: Arc<Matcher>,
    resolver: Option<Arc<EmbeddingResolver>>,
    max_workers: usize,
}

impl BatchMatcher {
    pub fn new(matcher: Arc<Matcher>, max_workers: usize) -> Self {
        Self {
            matcher,
            resolver: None,
            max_workers: max_workers.max(1),
        }
    }

    /// Fetch missing embeddings through `resolver`
    pub fn with_resolver(mut self, resolver: Arc<EmbeddingResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Match `job` against every resume; results keep the input order
    pub async fn run(&self, job: JobDocument, cvs: Vec<CvDocument>) -> Result<Vec<MatchResult>> {
        let total = cvs.len();
        log::info!("Matching {} resumes with {} workers", total, self.max_workers);

        let must_haves = Arc::new(self.matcher.extract_must_haves(&job.text));
        let job_embedding = match (&job.embedding, &self.resolver) {
            (Some(embedding), _) => Some(embedding.clone()),
            (None, Some(resolver)) => resolver.resolve(&job.text).await,
            (None, None) => None,
        };
        let job_text: Arc<str> = Arc::from(job.text.as_str());
        let job_embedding = Arc::new(job_embedding);

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut join_set = JoinSet::new();

        for (position, cv) in cvs.into_iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| JobMatcherError::Processing(e.to_string()))?;
            let matcher = Arc::clone(&self.matcher);
            let resolver = self.resolver.clone();
            let must_haves = Arc::clone(&must_haves);
            let job_text = Arc::clone(&job_text);
            let job_embedding = Arc::clone(&job_embedding);

            join_set.spawn(async move {
                let cv_embedding = match (&cv.embedding, &resolver) {
                    (Some(embedding), _) => Some(embedding.clone()),
                    (None, Some(resolver)) => resolver.resolve(&cv.searchable_text()).await,
                    (None, None) => None,
                };

                let result = tokio::task::spawn_blocking(move || {
                    matcher.match_job_to_cv(
                        &job_text,
                        &cv,
                        &must_haves,
                        job_embedding.as_deref(),
                        cv_embedding.as_deref(),
                    )
                })
                .await;
                drop(permit);
                (position, result)
            });
        }

        let mut results: Vec<Option<MatchResult>> = vec![None; total];
        while let Some(joined) = join_set.join_next().await {
            let (position, result) = joined.map_err(|e| JobMatcherError::Processing(e.to_string()))?;
            let result = result.map_err(|e| JobMatcherError::Processing(e.to_string()))?;
            log::debug!("Resume '{}' scored {:.4}", result.cv_id, result.score);
            results[position] = Some(result);
        }

        results
            .into_iter()
            .enumerate()
            .map(|(position, result)| {
                result.ok_or_else(|| JobMatcherError::Processing(format!("No result for resume #{}", position)))
            })
            .collect()
    }
}
