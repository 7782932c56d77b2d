//! Input manager for job postings, resumes and embedding files

use crate::error::{JobMatcherError, Result};
use crate::input::file_detector::FileType;
use crate::processing::analyzer::Matcher;
use crate::processing::document::{CvDocument, JobDocument};
use crate::processing::embeddings::is_valid_embedding;
use log::info;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Read a `.txt` or `.md` document as plain text
    pub async fn read_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(&path_str) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        if !path.exists() {
            return Err(JobMatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        if !FileType::from_path(path).is_document() {
            return Err(JobMatcherError::UnsupportedFormat(format!(
                "Expected a .txt or .md file: {}",
                path.display()
            )));
        }

        info!("Reading {}", path.display());
        let text = fs::read_to_string(path).await?;

        if self.enable_cache {
            self.cache.insert(path_str, text.clone());
        }

        Ok(text)
    }

    pub async fn load_job(&mut self, path: &Path, embedding: Option<&Path>) -> Result<JobDocument> {
        let mut job = JobDocument::new(self.read_text(path).await?);
        if let Some(embedding_path) = embedding {
            job = job.with_embedding(self.load_embedding(embedding_path).await?);
        }
        Ok(job)
    }

    /// Resume identified by its file stem and split into sections
    pub async fn load_resume(
        &mut self,
        path: &Path,
        matcher: &Matcher,
        embedding: Option<&Path>,
    ) -> Result<CvDocument> {
        let text = self.read_text(path).await?;
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| id.clone());

        let mut cv = matcher.parse_cv(&id, &name, &text);
        if let Some(embedding_path) = embedding {
            cv = cv.with_embedding(self.load_embedding(embedding_path).await?);
        }
        Ok(cv)
    }

    /// Embedding stored as a JSON array of numbers
    pub async fn load_embedding(&self, path: &Path) -> Result<Vec<f32>> {
        if FileType::from_path(path) != FileType::Json {
            return Err(JobMatcherError::UnsupportedFormat(format!(
                "Embeddings must be a .json array: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await?;
        let embedding: Vec<f32> = serde_json::from_str(&content)?;
        if !is_valid_embedding(&embedding) {
            return Err(JobMatcherError::Embedding(format!(
                "Embedding in {} is empty or contains non-finite values",
                path.display()
            )));
        }
        info!("Loaded {}-dimensional embedding from {}", embedding.len(), path.display());
        Ok(embedding)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_read_text_and_cache() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "job.txt", "Backend Engineer");
        let mut manager = InputManager::new();

        assert_eq!(manager.read_text(&path).await.unwrap(), "Backend Engineer");
        assert_eq!(manager.cache_size(), 1);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(manager.read_text(&path).await.unwrap(), "Backend Engineer");

        manager.clear_cache();
        assert!(matches!(
            manager.read_text(&path).await,
            Err(JobMatcherError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_documents() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "resume.pdf", "%PDF-1.7");
        let mut manager = InputManager::new();

        assert!(matches!(
            manager.read_text(&path).await,
            Err(JobMatcherError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_load_embedding() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "job.json", "[0.1, 0.2, 0.3]");
        let empty = write_file(&dir, "empty.json", "[]");
        let broken = write_file(&dir, "broken.json", "[0.1, \"x\"]");
        let manager = InputManager::new();

        assert_eq!(manager.load_embedding(&good).await.unwrap(), vec![0.1, 0.2, 0.3]);
        assert!(matches!(
            manager.load_embedding(&empty).await,
            Err(JobMatcherError::Embedding(_))
        ));
        assert!(matches!(
            manager.load_embedding(&broken).await,
            Err(JobMatcherError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_load_resume_uses_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "alice.md", "# Skills\nRust, Tokio\n\n# Experience\n2023 - present: Engineer");
        let matcher = Matcher::with_reference_year(MatchingConfig::default(), 2025).unwrap();
        let mut manager = InputManager::new();

        let cv = manager.load_resume(&path, &matcher, None).await.unwrap();

        assert_eq!(cv.id, "alice");
        assert_eq!(cv.name, "alice.md");
        assert_eq!(cv.sections.skills, "Rust, Tokio");
        assert!(cv.embedding.is_none());
    }
}
