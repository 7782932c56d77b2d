//! Dense similarity over externally produced embeddings.
//!
//! The engine never computes embeddings itself. Vectors come from an
//! [`EmbeddingProvider`], are memoized in an injectable [`EmbeddingCache`]
//! keyed by text, and are fetched through an [`EmbeddingResolver`] that bounds
//! concurrency and applies a timeout. Any failure degrades to "no vector".

use crate::config::EmbeddingConfig;
use crate::error::{JobMatcherError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Cosine similarity of two vectors of equal length.
///
/// Errors on a dimension mismatch; empty or zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(JobMatcherError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

/// Non-empty and every component finite
pub fn is_valid_embedding(embedding: &[f32]) -> bool {
    !embedding.is_empty() && embedding.iter().all(|x| x.is_finite())
}

/// Dense term of the blend, always in [0, 1].
///
/// Missing, empty, unequal-length or non-finite vectors give exactly 0.
/// Negative similarity is clamped to 0.
pub fn dense_similarity(job: Option<&[f32]>, cv: Option<&[f32]>) -> f32 {
    let (Some(job), Some(cv)) = (job, cv) else {
        return 0.0;
    };
    if !is_valid_embedding(job) || !is_valid_embedding(cv) {
        return 0.0;
    }

    match cosine_similarity(job, cv) {
        Ok(score) if score.is_finite() => score.clamp(0.0, 1.0),
        Ok(_) => 0.0,
        Err(e) => {
            log::debug!("Ignoring malformed embeddings: {}", e);
            0.0
        }
    }
}

/// Source of embedding vectors, possibly remote or slow
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Memoizes embeddings by text content
pub trait EmbeddingCache: Send + Sync {
    fn get(&self, text: &str) -> Option<Vec<f32>>;
    fn insert(&self, text: &str, embedding: Vec<f32>);
    fn len(&self) -> usize;
    fn clear(&self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEmbeddingCache {
    entries: Mutex<HashMap<String, Vec<f32>>>,
}

impl InMemoryEmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<f32>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EmbeddingCache for InMemoryEmbeddingCache {
    fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries().get(text).cloned()
    }

    fn insert(&self, text: &str, embedding: Vec<f32>) {
        self.entries().insert(text.to_string(), embedding);
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

/// Provider serving vectors computed ahead of time, keyed by exact text
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
}

impl PrecomputedEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), embedding);
        self
    }

    pub fn insert(&mut self, text: impl Into<String>, embedding: Vec<f32>) {
        self.vectors.insert(text.into(), embedding);
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[async_trait]
impl EmbeddingProvider for PrecomputedEmbeddings {
    fn name(&self) -> &str {
        "precomputed"
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no precomputed embedding for text of {} chars", text.chars().count()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub failures: usize,
}

/// Fetches embeddings through a cache, a concurrency limit and a timeout
pub struct EmbeddingResolver {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<dyn EmbeddingCache>,
    limiter: Semaphore,
    timeout: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
    failures: AtomicUsize,
}

impl EmbeddingResolver {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<dyn EmbeddingCache>,
        config: &EmbeddingConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            limiter: Semaphore::new(config.max_concurrent.max(1)),
            timeout: Duration::from_millis(config.timeout_ms),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    /// Embedding for `text`, or `None` when the provider fails, times out or
    /// returns a malformed vector
    pub async fn resolve(&self, text: &str) -> Option<Vec<f32>> {
        match self.try_resolve(text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Embedding provider '{}' unavailable, falling back to lexical scoring: {}",
                    self.provider.name(),
                    e
                );
                None
            }
        }
    }

    pub async fn try_resolve(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| JobMatcherError::Embedding(format!("Embedding limiter closed: {}", e)))?;

        let embedding = tokio::time::timeout(self.timeout, self.provider.embed(text))
            .await
            .map_err(|_| JobMatcherError::EmbeddingTimeout(self.timeout.as_millis() as u64))?
            .map_err(|e| JobMatcherError::Embedding(e.to_string()))?;

        if !is_valid_embedding(&embedding) {
            return Err(JobMatcherError::Embedding(format!(
                "Provider returned a malformed vector of length {}",
                embedding.len()
            )));
        }

        self.cache.insert(text, embedding.clone());
        Ok(embedding)
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::JoinSet;

    struct CountingProvider {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        delay: Duration,
        response: Option<Vec<f32>>,
    }

    impl CountingProvider {
        fn new(delay: Duration, response: Option<Vec<f32>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                delay,
                response,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.response.clone().ok_or_else(|| anyhow::anyhow!("provider offline"))
        }
    }

    fn config(max_concurrent: usize, timeout_ms: u64) -> EmbeddingConfig {
        EmbeddingConfig {
            max_concurrent,
            timeout_ms,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&a, &a).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
        assert!(cosine_similarity(&a, &[1.0]).is_err());
    }

    #[test]
    fn test_dense_similarity_clamps_negative() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert_eq!(dense_similarity(Some(&a), Some(&b)), 0.0);
    }

    #[test]
    fn test_dense_similarity_degenerate_inputs() {
        let good = [0.5, 0.5, 0.1];

        assert_eq!(dense_similarity(None, Some(&good)), 0.0);
        assert_eq!(dense_similarity(Some(&good), None), 0.0);
        assert_eq!(dense_similarity(Some(&[]), Some(&[])), 0.0);
        assert_eq!(dense_similarity(Some(&good), Some(&[0.5, 0.5])), 0.0);
        assert_eq!(dense_similarity(Some(&good), Some(&[f32::NAN, 0.5, 0.1])), 0.0);
        assert_eq!(dense_similarity(Some(&good), Some(&[0.0, 0.0, 0.0])), 0.0);

        let score = dense_similarity(Some(&good), Some(&good));
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_in_memory_cache() {
        let cache = InMemoryEmbeddingCache::new();
        assert!(cache.is_empty());

        cache.insert("rust", vec![1.0, 2.0]);
        assert_eq!(cache.get("rust"), Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("python"), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_caches_by_text() {
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(1), Some(vec![0.1, 0.2])));
        let resolver = EmbeddingResolver::new(
            provider.clone(),
            Arc::new(InMemoryEmbeddingCache::new()),
            &config(2, 1000),
        );

        assert_eq!(resolver.resolve("job text").await, Some(vec![0.1, 0.2]));
        assert_eq!(resolver.resolve("job text").await, Some(vec![0.1, 0.2]));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let stats = resolver.cache_stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_resolver_timeout_degrades_to_none() {
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(500), Some(vec![1.0])));
        let resolver = EmbeddingResolver::new(provider, Arc::new(InMemoryEmbeddingCache::new()), &config(1, 10));

        assert!(matches!(
            resolver.try_resolve("slow").await,
            Err(JobMatcherError::EmbeddingTimeout(10))
        ));
        assert_eq!(resolver.resolve("slow").await, None);
        assert_eq!(resolver.cache_stats().entries, 0);
    }

    #[tokio::test]
    async fn test_resolver_failure_and_malformed_vectors() {
        let failing = EmbeddingResolver::new(
            Arc::new(CountingProvider::new(Duration::ZERO, None)),
            Arc::new(InMemoryEmbeddingCache::new()),
            &config(1, 1000),
        );
        assert_eq!(failing.resolve("text").await, None);
        assert_eq!(failing.cache_stats().failures, 1);

        let malformed = EmbeddingResolver::new(
            Arc::new(CountingProvider::new(Duration::ZERO, Some(vec![f32::INFINITY]))),
            Arc::new(InMemoryEmbeddingCache::new()),
            &config(1, 1000),
        );
        assert_eq!(malformed.resolve("text").await, None);
    }

    #[tokio::test]
    async fn test_resolver_bounds_concurrency() {
        let provider = Arc::new(CountingProvider::new(Duration::from_millis(20), Some(vec![1.0])));
        let resolver = Arc::new(EmbeddingResolver::new(
            provider.clone(),
            Arc::new(InMemoryEmbeddingCache::new()),
            &config(2, 1000),
        ));

        let mut tasks = JoinSet::new();
        for i in 0..6 {
            let resolver = Arc::clone(&resolver);
            tasks.spawn(async move { resolver.resolve(&format!("text {}", i)).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_some());
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
        assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_precomputed_provider() {
        let provider = PrecomputedEmbeddings::new().with_vector("job", vec![0.3, 0.4]);

        assert_eq!(provider.embed("job").await.unwrap(), vec![0.3, 0.4]);
        assert!(provider.embed("other").await.is_err());
    }
}
