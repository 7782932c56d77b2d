//! Text processing and matching module

pub mod analyzer;
pub mod batch;
pub mod bm25;
pub mod calibration;
pub mod document;
pub mod embeddings;
pub mod explanation;
pub mod must_have;
pub mod recency;
pub mod section_scorer;
pub mod text_processor;
pub mod vocabulary;
