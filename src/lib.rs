//! Job matcher library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use config::{Config, MatchingConfig};
pub use error::{JobMatcherError, Result};
pub use processing::analyzer::{MatchResult, Matcher, ScoreBreakdown};
pub use processing::batch::BatchMatcher;
pub use processing::document::{CvDocument, JobDocument, Sections};
pub use processing::embeddings::{EmbeddingCache, EmbeddingProvider, EmbeddingResolver, InMemoryEmbeddingCache};
pub use processing::explanation::{Explanation, TopSentence};
pub use processing::must_have::{MustHaveReport, MustHaveSet};
