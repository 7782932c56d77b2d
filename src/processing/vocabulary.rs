//! Curated technical vocabulary, skill synonyms and capitalized term detection

use crate::error::{JobMatcherError, Result};
use crate::processing::text_processor::TextProcessor;
use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermFamily {
    Language,
    Framework,
    Database,
    Cloud,
    Tool,
    MachineLearning,
}

/// Curated technical terms by family. Matching is case-insensitive and whole-word.
pub const TERM_FAMILIES: &[(TermFamily, &[&str])] = &[
    (
        TermFamily::Language,
        &[
            "rust", "python", "java", "javascript", "typescript", "golang", "c++", "c#",
            "kotlin", "swift", "scala", "ruby", "php", "haskell", "elixir", "clojure",
            "perl", "matlab", "sql", "bash", "html", "css", "dart", "lua", "solidity",
        ],
    ),
    (
        TermFamily::Framework,
        &[
            "react", "angular", "vue", "svelte", "next.js", "node.js", "express", "django",
            "flask", "fastapi", "spring", "spring boot", "rails", "ruby on rails", "laravel",
            ".net", "asp.net", "tokio", "actix", "axum", "graphql", "grpc", "rest", "tailwind",
            "flutter", "jquery",
        ],
    ),
    (
        TermFamily::Database,
        &[
            "postgresql", "mysql", "mariadb", "sqlite", "mongodb", "redis", "cassandra",
            "dynamodb", "elasticsearch", "opensearch", "neo4j", "oracle", "sql server",
            "snowflake", "bigquery", "clickhouse", "kafka", "rabbitmq",
        ],
    ),
    (
        TermFamily::Cloud,
        &[
            "aws", "azure", "gcp", "google cloud", "kubernetes", "docker", "terraform",
            "ansible", "openshift", "helm", "serverless", "lambda", "cloudformation",
            "pulumi", "nginx",
        ],
    ),
    (
        TermFamily::Tool,
        &[
            "git", "github", "gitlab", "github actions", "jenkins", "jira", "linux", "ci/cd",
            "grafana", "prometheus", "datadog", "webpack", "vite", "maven", "gradle",
            "cargo", "figma", "selenium", "cypress", "playwright",
        ],
    ),
    (
        TermFamily::MachineLearning,
        &[
            "machine learning", "deep learning", "tensorflow", "pytorch", "scikit-learn",
            "pandas", "numpy", "spark", "hadoop", "airflow", "nlp", "llm", "computer vision",
            "natural language processing", "ml", "ai",
        ],
    ),
];

/// Curated terms that are also everyday English words. They only count as
/// skills when written with an uppercase letter ("REST", "Spark").
pub const AMBIGUOUS_TERMS: &[&str] = &[
    "rest", "express", "spring", "swift", "oracle", "lambda", "helm", "cargo", "spark",
    "rails", "dart", "flutter", "serverless",
];

/// Groups of interchangeable skill spellings; the first entry is the canonical name.
pub const SKILL_SYNONYMS: &[&[&str]] = &[
    &["javascript", "js", "ecmascript"],
    &["typescript", "ts"],
    &["golang", "go"],
    &["kubernetes", "k8s"],
    &["postgresql", "postgres", "psql"],
    &["mongodb", "mongo"],
    &["aws", "amazon web services"],
    &["gcp", "google cloud", "google cloud platform"],
    &["azure", "microsoft azure"],
    &["node.js", "nodejs", "node"],
    &["react", "react.js", "reactjs"],
    &["vue", "vue.js", "vuejs"],
    &["next.js", "nextjs"],
    &["c#", "csharp", "c sharp"],
    &["c++", "cpp"],
    &["ci/cd", "cicd", "ci-cd", "continuous integration", "continuous delivery"],
    &["machine learning", "ml"],
    &["artificial intelligence", "ai"],
    &["natural language processing", "nlp"],
    &["scikit-learn", "sklearn"],
    &["elasticsearch", "elastic search", "opensearch"],
    &["rest", "restful", "rest api"],
    &["terraform", "infrastructure as code", "iac"],
    &["docker", "containers", "containerization"],
];

/// Runs of two or more capitalized words, e.g. "Google Cloud Platform".
const CAPITALIZED_TERM_PATTERN: &str = r"\b[A-Z][A-Za-z0-9+#.]*(?:[ \t]+[A-Z][A-Za-z0-9+#.]*)+";

/// Technical vocabulary lookups shared by the scorer, the must-have extractor
/// and the explanation generator.
pub struct TechVocabulary {
    matcher: AhoCorasick,
    patterns: Vec<&'static str>,
    technical_tokens: HashSet<String>,
    capitalized_term: Regex,
}

impl TechVocabulary {
    pub fn new() -> Result<Self> {
        let mut patterns: Vec<&'static str> = TERM_FAMILIES
            .iter()
            .flat_map(|(_, terms)| terms.iter().copied())
            .collect();
        patterns.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        patterns.dedup();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| {
                JobMatcherError::Processing(format!("Failed to build vocabulary matcher: {}", e))
            })?;

        let processor = TextProcessor::new();
        let technical_tokens = patterns
            .iter()
            .copied()
            .chain(SKILL_SYNONYMS.iter().flat_map(|group| group.iter().copied()))
            .flat_map(|term| processor.tokenize(term))
            .collect();

        Ok(Self {
            matcher,
            patterns,
            technical_tokens,
            capitalized_term: Regex::new(CAPITALIZED_TERM_PATTERN)?,
        })
    }

    /// Whether a tokenizer token belongs to the curated vocabulary
    pub fn is_technical_token(&self, token: &str) -> bool {
        self.technical_tokens.contains(token)
    }

    /// Family of a curated term, if any
    pub fn family_of(&self, term: &str) -> Option<TermFamily> {
        let lowered = term.trim().to_lowercase();
        TERM_FAMILIES
            .iter()
            .find(|(_, terms)| terms.contains(&lowered.as_str()))
            .map(|(family, _)| *family)
    }

    /// Curated terms occurring as whole words in `text`, as written, in order of appearance
    pub fn find_terms<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.matcher
            .find_iter(text)
            .filter(|m| is_word_bounded(text, m.start(), m.end()))
            .map(|m| &text[m.start()..m.end()])
            .collect()
    }

    /// Like [`find_terms`](Self::find_terms), minus lowercase hits of [`AMBIGUOUS_TERMS`]
    pub fn find_skill_terms<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.find_terms(text)
            .into_iter()
            .filter(|term| !is_ambiguous(term) || term.chars().any(char::is_uppercase))
            .collect()
    }

    /// Capitalized multi-word terms such as "Google Cloud Platform"
    pub fn capitalized_terms<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.capitalized_term
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches('.'))
            .collect()
    }

    /// Tokens that earn the technical IDF boost for a corpus: every curated
    /// token plus the tokens of capitalized multi-word terms in the documents
    pub fn boosted_tokens(&self, processor: &TextProcessor, documents: &[&str]) -> BTreeSet<String> {
        let mut boosted = BTreeSet::new();
        for document in documents {
            for token in processor.tokenize(document) {
                if self.is_technical_token(&token) {
                    boosted.insert(token);
                }
            }
            for term in self.capitalized_terms(document) {
                boosted.extend(processor.tokenize(term));
            }
        }
        boosted
    }

    pub fn term_count(&self) -> usize {
        self.patterns.len()
    }
}

/// Synonym group containing `skill`, compared case-insensitively
pub fn synonyms_for(skill: &str) -> Option<&'static [&'static str]> {
    let lowered = skill.trim().to_lowercase();
    SKILL_SYNONYMS
        .iter()
        .copied()
        .find(|group| group.contains(&lowered.as_str()))
}

/// Whole-word containment that tolerates terms ending in `+`, `#` or `.`
pub fn contains_word(haystack_lower: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return false;
    }
    haystack_lower
        .match_indices(needle_lower)
        .any(|(start, matched)| is_word_bounded(haystack_lower, start, start + matched.len()))
}

fn is_ambiguous(term: &str) -> bool {
    let lowered = term.to_lowercase();
    AMBIGUOUS_TERMS.contains(&lowered.as_str())
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    let bounded = |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric() && c != '+' && c != '#');
    bounded(before) && bounded(after)
}
