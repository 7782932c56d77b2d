//! Human-readable evidence for a match: shared keywords and the most relevant resume sentences

use crate::config::ExplanationConfig;
use crate::processing::bm25::{Bm25Index, Bm25Scorer};
use crate::processing::text_processor::{truncate_text, TextProcessor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub matched_keywords: Vec<String>,
    pub missing_must_haves: Vec<String>,
    pub top_sentences: Vec<TopSentence>,
}

impl Explanation {
    pub fn is_empty(&self) -> bool {
        self.matched_keywords.is_empty() && self.missing_must_haves.is_empty() && self.top_sentences.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSentence {
    pub text: String,
    pub score: f32,
}

pub struct ExplanationBuilder<'a> {
    processor: &'a TextProcessor,
    scorer: &'a Bm25Scorer<'a>,
    config: &'a ExplanationConfig,
}

impl<'a> ExplanationBuilder<'a> {
    pub fn new(processor: &'a TextProcessor, scorer: &'a Bm25Scorer<'a>, config: &'a ExplanationConfig) -> Self {
        Self {
            processor,
            scorer,
            config,
        }
    }

    /// Assemble the explanation from an index whose documents are the job
    /// posting (`job_doc`) and the resume (`cv_doc`)
    pub fn build(
        &self,
        index: &Bm25Index,
        job_doc: usize,
        cv_doc: usize,
        job_text: &str,
        cv_text: &str,
        missing_must_haves: Vec<String>,
    ) -> Explanation {
        Explanation {
            matched_keywords: self.matched_keywords(index, job_doc, cv_doc),
            missing_must_haves,
            top_sentences: self.top_sentences(job_text, cv_text),
        }
    }

    /// Terms present in both documents ranked by `job_tf * cv_tf * idf`,
    /// ties alphabetical
    pub fn matched_keywords(&self, index: &Bm25Index, job_doc: usize, cv_doc: usize) -> Vec<String> {
        let Some(job_terms) = index.terms(job_doc) else {
            return Vec::new();
        };

        let mut ranked: Vec<(&String, f32)> = job_terms
            .iter()
            .filter_map(|(term, &job_tf)| {
                let cv_tf = index.term_frequency(cv_doc, term);
                (cv_tf > 0).then(|| (term, job_tf as f32 * cv_tf as f32 * index.idf(term)))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        ranked
            .into_iter()
            .take(self.config.max_keywords)
            .map(|(term, _)| term.clone())
            .collect()
    }

    /// Resume sentences most relevant to any job sentence
    pub fn top_sentences(&self, job_text: &str, cv_text: &str) -> Vec<TopSentence> {
        let job_queries: Vec<BTreeSet<String>> = self
            .processor
            .split_sentences(job_text)
            .iter()
            .map(|sentence| self.scorer.query_terms(sentence))
            .filter(|terms| !terms.is_empty())
            .collect();
        if job_queries.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, String, f32)> = self
            .processor
            .split_sentences(cv_text)
            .into_iter()
            .filter(|sentence| sentence.chars().count() > self.config.min_sentence_chars)
            .enumerate()
            .filter_map(|(position, sentence)| {
                let index = self.scorer.index(&[sentence.as_str()]);
                let relevance = job_queries
                    .iter()
                    .map(|terms| index.score_terms(terms, 0))
                    .fold(0.0f32, f32::max);
                (relevance > 0.0).then_some((position, sentence, relevance))
            })
            .collect();

        scored.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));

        scored
            .into_iter()
            .take(self.config.max_sentences)
            .map(|(_, sentence, score)| TopSentence {
                text: truncate_text(&sentence, self.config.max_sentence_chars),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bm25Config;
    use crate::processing::vocabulary::TechVocabulary;

    fn fixtures() -> (TextProcessor, TechVocabulary, ExplanationConfig) {
        (TextProcessor::new(), TechVocabulary::new().unwrap(), ExplanationConfig::default())
    }

    #[test]
    fn test_matched_keywords_ranking() {
        let (processor, vocabulary, config) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let builder = ExplanationBuilder::new(&processor, &scorer, &config);

        let job = "Python python backend APIs. Kubernetes cluster. Gardening";
        let cv = "Python services and backend APIs on Kubernetes";
        let index = scorer.index(&[job, cv]);

        let keywords = builder.matched_keywords(&index, 0, 1);

        assert_eq!(keywords[0], "python");
        assert!(keywords.contains(&"kubernetes".to_string()));
        assert!(keywords.contains(&"backend".to_string()));
        assert!(!keywords.contains(&"gardening".to_string()));
        assert!(!keywords.contains(&"services".to_string()));
    }

    #[test]
    fn test_matched_keywords_limit() {
        let (processor, vocabulary, mut config) = fixtures();
        config.max_keywords = 2;
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let builder = ExplanationBuilder::new(&processor, &scorer, &config);
        let text = "alpha bravo charlie delta";
        let index = scorer.index(&[text, text]);

        assert_eq!(builder.matched_keywords(&index, 0, 1), vec!["alpha", "bravo"]);
    }

    #[test]
    fn test_top_sentences() {
        let (processor, vocabulary, config) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let builder = ExplanationBuilder::new(&processor, &scorer, &config);

        let job = "We need Rust and Kafka experience. Python is a plus.";
        let cv = "Short line. Built streaming pipelines in Rust with Kafka. Enjoys hiking in the alps every summer. Wrote Python tooling for the data team.";

        let sentences = builder.top_sentences(job, cv);

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "Built streaming pipelines in Rust with Kafka.");
        assert!(sentences[0].score > sentences[1].score);
        assert!(sentences.iter().all(|s| s.score > 0.0));
    }

    #[test]
    fn test_top_sentences_truncated_and_limited() {
        let (processor, vocabulary, config) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let builder = ExplanationBuilder::new(&processor, &scorer, &config);

        let long = format!("Rust services {}.", "with careful engineering ".repeat(10));
        let cv = format!("{} Rust compiler work for years. Rust embedded firmware. Rust web backends here.", long);
        let sentences = builder.top_sentences("Rust", &cv);

        assert_eq!(sentences.len(), 3);
        assert!(sentences.iter().all(|s| s.text.chars().count() <= 153));
        assert!(sentences
            .iter()
            .any(|s| s.text.ends_with("...") && s.text.starts_with("Rust services")));
    }

    #[test]
    fn test_empty_inputs() {
        let (processor, vocabulary, config) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let builder = ExplanationBuilder::new(&processor, &scorer, &config);

        assert!(builder.top_sentences("", "Built streaming pipelines in Rust.").is_empty());
        assert!(builder.top_sentences("Rust", "").is_empty());
        let index = scorer.index(&["", ""]);
        assert!(builder.matched_keywords(&index, 0, 1).is_empty());
    }
}
