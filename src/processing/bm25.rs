//! BM25 lexical scoring over small, per-call corpora.
//!
//! Every index here is ephemeral: it is built for one comparison (or one
//! keyword-mining run) and dropped afterwards. Term statistics are kept in
//! ordered maps so that summation order, and therefore every floating-point
//! result, is identical across runs.

use crate::config::Bm25Config;
use crate::processing::text_processor::TextProcessor;
use crate::processing::vocabulary::TechVocabulary;
use std::collections::{BTreeMap, BTreeSet};

/// Raw scores below this use square-root compression.
const SQRT_KNEE: f32 = 5.0;
/// Raw scores above this use logarithmic compression.
const LOG_KNEE: f32 = 15.0;
const SQRT_CEILING: f32 = 0.5;
const LINEAR_CEILING: f32 = 0.8;

/// Inverted statistics for a handful of documents
#[derive(Debug, Clone)]
pub struct Bm25Index {
    documents: Vec<BTreeMap<String, usize>>,
    doc_lengths: Vec<usize>,
    document_frequencies: BTreeMap<String, usize>,
    boosted: BTreeSet<String>,
    params: Bm25Config,
}

impl Bm25Index {
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn average_doc_length(&self) -> f32 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.doc_lengths.iter().sum::<usize>() as f32 / self.doc_lengths.len() as f32
    }

    pub fn doc_length(&self, doc_id: usize) -> usize {
        self.doc_lengths.get(doc_id).copied().unwrap_or(0)
    }

    pub fn term_frequency(&self, doc_id: usize, term: &str) -> usize {
        self.documents
            .get(doc_id)
            .and_then(|terms| terms.get(term))
            .copied()
            .unwrap_or(0)
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequencies.get(term).copied().unwrap_or(0)
    }

    /// Term frequencies of one document, ordered by term
    pub fn terms(&self, doc_id: usize) -> Option<&BTreeMap<String, usize>> {
        self.documents.get(doc_id)
    }

    pub fn is_boosted(&self, term: &str) -> bool {
        self.boosted.contains(term)
    }

    /// Smoothed IDF `ln((N+1)/(df+0.5))`, boosted for technical terms
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count() as f32;
        let df = self.document_frequency(term) as f32;
        let idf = ((n + 1.0) / (df + 0.5)).ln();
        if self.is_boosted(term) {
            idf * self.params.technical_boost
        } else {
            idf
        }
    }

    /// Contribution of one term to one document; absent terms contribute 0
    pub fn term_score(&self, term: &str, doc_id: usize) -> f32 {
        let tf = self.term_frequency(doc_id, term) as f32;
        if tf == 0.0 {
            return 0.0;
        }

        let k1 = self.params.k1;
        let b = self.params.b;
        let avgdl = self.average_doc_length();
        let length_ratio = if avgdl > 0.0 {
            self.doc_length(doc_id) as f32 / avgdl
        } else {
            0.0
        };

        let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
        self.idf(term) * tf_norm
    }

    /// Sum of term scores for distinct query terms, in term order
    pub fn score_terms(&self, query_terms: &BTreeSet<String>, doc_id: usize) -> f32 {
        query_terms
            .iter()
            .map(|term| self.term_score(term, doc_id))
            .sum()
    }
}

/// Builds indexes and scores queries with one set of BM25 parameters
pub struct Bm25Scorer<'a> {
    processor: &'a TextProcessor,
    vocabulary: &'a TechVocabulary,
    params: Bm25Config,
}

impl<'a> Bm25Scorer<'a> {
    pub fn new(processor: &'a TextProcessor, vocabulary: &'a TechVocabulary, params: Bm25Config) -> Self {
        Self {
            processor,
            vocabulary,
            params,
        }
    }

    /// Index the given documents; document ids are their positions
    pub fn index(&self, documents: &[&str]) -> Bm25Index {
        let mut indexed = Vec::with_capacity(documents.len());
        let mut doc_lengths = Vec::with_capacity(documents.len());
        let mut document_frequencies: BTreeMap<String, usize> = BTreeMap::new();

        for document in documents {
            let tokens = self.processor.tokenize(document);
            doc_lengths.push(tokens.len());

            let mut frequencies: BTreeMap<String, usize> = BTreeMap::new();
            for token in tokens {
                *frequencies.entry(token).or_insert(0) += 1;
            }
            for term in frequencies.keys() {
                *document_frequencies.entry(term.clone()).or_insert(0) += 1;
            }
            indexed.push(frequencies);
        }

        Bm25Index {
            documents: indexed,
            doc_lengths,
            document_frequencies,
            boosted: self.vocabulary.boosted_tokens(self.processor, documents),
            params: self.params.clone(),
        }
    }

    /// Distinct query tokens in term order
    pub fn query_terms(&self, query: &str) -> BTreeSet<String> {
        self.processor.tokenize(query).into_iter().collect()
    }

    /// Score `query` against `text` using a temporary single-document index,
    /// so the result depends only on the query and that one document.
    pub fn score_query(&self, query: &str, text: &str) -> f32 {
        let query_terms = self.query_terms(query);
        if query_terms.is_empty() {
            return 0.0;
        }
        let index = self.index(&[text]);
        index.score_terms(&query_terms, 0)
    }

    /// Rank the distinctive terms of `target` against a background corpus.
    ///
    /// Each term of `target` is scored by its own BM25 contribution inside an
    /// index over `target` plus `corpus`; terms shared with many corpus
    /// documents sink. Ties are broken alphabetically.
    pub fn mine_keywords(&self, target: &str, corpus: &[&str], limit: usize) -> Vec<(String, f32)> {
        let mut documents = Vec::with_capacity(corpus.len() + 1);
        documents.push(target);
        documents.extend_from_slice(corpus);
        let index = self.index(&documents);

        let mut ranked: Vec<(String, f32)> = match index.terms(0) {
            Some(terms) => terms
                .keys()
                .map(|term| (term.clone(), index.term_score(term, 0)))
                .collect(),
            None => Vec::new(),
        };
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }
}

/// Map an unbounded raw BM25 score onto [0, 1].
///
/// Piecewise and continuous: square-root compression below 5 (reaching 0.5),
/// linear between 5 and 15 (reaching 0.8), logarithmic saturation towards 1.0
/// above 15. Monotonic non-decreasing; NaN or non-positive input maps to 0,
/// positive infinity to 1.
pub fn normalize_bm25(raw: f32) -> f32 {
    if raw.is_nan() || raw <= 0.0 {
        return 0.0;
    }
    if raw == f32::INFINITY {
        return 1.0;
    }

    let normalized = if raw < SQRT_KNEE {
        SQRT_CEILING * (raw / SQRT_KNEE).sqrt()
    } else if raw < LOG_KNEE {
        SQRT_CEILING + (LINEAR_CEILING - SQRT_CEILING) * (raw - SQRT_KNEE) / (LOG_KNEE - SQRT_KNEE)
    } else {
        let growth = (raw / LOG_KNEE).ln();
        LINEAR_CEILING + (1.0 - LINEAR_CEILING) * growth / (1.0 + growth)
    };

    normalized.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (TextProcessor, TechVocabulary) {
        (TextProcessor::new(), TechVocabulary::new().unwrap())
    }

    #[test]
    fn test_empty_query_and_document() {
        let (processor, vocabulary) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());

        assert_eq!(scorer.score_query("", "rust programming"), 0.0);
        assert_eq!(scorer.score_query("rust programming", ""), 0.0);
        assert_eq!(scorer.score_query("   ", "   "), 0.0);
    }

    #[test]
    fn test_absent_terms_contribute_nothing() {
        let (processor, vocabulary) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());

        assert_eq!(scorer.score_query("haskell", "rust programming systems"), 0.0);
    }

    #[test]
    fn test_term_score_formula() {
        let (processor, vocabulary) = fixtures();
        let params = Bm25Config::default();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, params.clone());

        let score = scorer.score_query("rust", "rust rust python");

        // single document: N = 1, df = 1, dl = avgdl = 3, tf = 2
        let idf = (2.0f32 / 1.5).ln() * params.technical_boost;
        let expected = idf * 2.0 * (params.k1 + 1.0) / (2.0 + params.k1);
        assert!((score - expected).abs() < 1e-6, "{} vs {}", score, expected);
    }

    #[test]
    fn test_idf_smoothing_and_boost() {
        let (processor, vocabulary) = fixtures();
        let params = Bm25Config::default();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, params.clone());
        let index = scorer.index(&["rust teamwork", "rust gardening"]);

        assert_eq!(index.doc_count(), 2);
        let shared = (3.0f32 / 2.5).ln();
        let unique = (3.0f32 / 1.5).ln();
        assert!((index.idf("rust") - shared * params.technical_boost).abs() < 1e-6);
        assert!((index.idf("teamwork") - unique).abs() < 1e-6);
    }

    #[test]
    fn test_self_score_is_maximal() {
        let (processor, vocabulary) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let query = "Senior Rust engineer building distributed storage with Kafka and Kubernetes";

        let self_score = scorer.score_query(query, query);
        for other in [
            "Rust engineer",
            "distributed storage",
            "Kubernetes Kafka",
            "gardening and cooking",
            "",
        ] {
            assert!(self_score >= scorer.score_query(query, other), "{}", other);
        }
        assert!(self_score > 0.0);
    }

    #[test]
    fn test_higher_tf_ranks_higher() {
        let (processor, vocabulary) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());
        let index = scorer.index(&["rust rust rust", "rust programming"]);
        let query = scorer.query_terms("rust");

        assert!(index.score_terms(&query, 0) > index.score_terms(&query, 1));
    }

    #[test]
    fn test_mine_keywords_prefers_distinctive_terms() {
        let (processor, vocabulary) = fixtures();
        let scorer = Bm25Scorer::new(&processor, &vocabulary, Bm25Config::default());

        let keywords = scorer.mine_keywords(
            "backend engineer kafka kafka rust",
            &["backend engineer java", "backend engineer python"],
            2,
        );

        let terms: Vec<&str> = keywords.iter().map(|(term, _)| term.as_str()).collect();
        assert_eq!(terms, vec!["kafka", "rust"]);
    }

    #[test]
    fn test_normalize_bounds_and_edges() {
        assert_eq!(normalize_bm25(0.0), 0.0);
        assert_eq!(normalize_bm25(-3.0), 0.0);
        assert_eq!(normalize_bm25(f32::NAN), 0.0);
        assert_eq!(normalize_bm25(f32::NEG_INFINITY), 0.0);
        assert_eq!(normalize_bm25(f32::INFINITY), 1.0);
        assert!(normalize_bm25(f32::MAX) <= normalize_bm25(f32::INFINITY));
        assert!((normalize_bm25(5.0) - 0.5).abs() < 1e-6);
        assert!((normalize_bm25(15.0) - 0.8).abs() < 1e-6);
        assert!(normalize_bm25(1e9) <= 1.0);
        assert!(normalize_bm25(1e9) > 0.95);
    }

    #[test]
    fn test_normalize_is_continuous_and_monotonic() {
        let mut previous = 0.0;
        let mut raw = 0.0f32;
        while raw < 200.0 {
            let value = normalize_bm25(raw);
            assert!(value >= previous, "not monotonic at {}", raw);
            assert!(value - previous < 0.1, "jump at {}", raw);
            previous = value;
            raw += 0.05;
        }

        for knee in [SQRT_KNEE, LOG_KNEE] {
            let below = normalize_bm25(knee - 1e-3);
            let above = normalize_bm25(knee + 1e-3);
            assert!((above - below).abs() < 1e-3);
        }
    }
}
