//! Text processing: tokenization and sentence splitting

use std::collections::{BTreeMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Characters kept inside tokens so terms like `c++`, `c#` and `node.js` survive.
const TECHNICAL_PUNCTUATION: [char; 4] = ['#', '+', '.', '-'];

/// Characters trimmed from the end of a token (sentence punctuation residue).
const TRAILING_PUNCTUATION: [char; 2] = ['.', '-'];

/// Tokens of this many characters or fewer are dropped.
const MIN_TOKEN_CHARS: usize = 2;

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stop_words: Self::create_stop_words(),
        }
    }

    /// Tokenize text for lexical scoring.
    ///
    /// Lowercases, blanks out punctuation other than `# + . -`, splits on
    /// whitespace, trims residual punctuation and drops short tokens and
    /// stop words. The output is stable: tokenizing `tokens.join(" ")` again
    /// yields the same tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned: String = lowered
            .chars()
            .map(|c| {
                if c.is_alphanumeric()
                    || c == '_'
                    || c.is_whitespace()
                    || TECHNICAL_PUNCTUATION.contains(&c)
                {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        cleaned
            .split_whitespace()
            .map(|raw| {
                raw.trim_start_matches(|c| TECHNICAL_PUNCTUATION.contains(&c))
                    .trim_end_matches(|c| TRAILING_PUNCTUATION.contains(&c))
            })
            .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
            .filter(|token| !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Split text into sentences
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Count token occurrences, ordered by token for reproducible iteration
    pub fn term_frequencies(&self, text: &str) -> BTreeMap<String, usize> {
        let mut frequencies = BTreeMap::new();
        for token in self.tokenize(text) {
            *frequencies.entry(token).or_insert(0) += 1;
        }
        frequencies
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// English and German function words
    fn create_stop_words() -> HashSet<&'static str> {
        [
            // English
            "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in",
            "is", "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "this",
            "but", "they", "have", "had", "what", "which", "she", "how", "their", "if", "out",
            "then", "them", "these", "some", "her", "would", "into", "him", "more", "our",
            "than", "been", "who", "may", "any", "also", "you", "your", "we", "are", "not",
            "all", "can", "were", "there", "about", "such", "other", "over", "only", "very",
            "just", "both", "each", "per", "via", "etc", "using", "use", "used", "within",
            "while", "where", "when", "able", "must", "should", "could", "well", "ideally",
            "plus", "years", "year",
            // German
            "der", "die", "das", "und", "oder", "mit", "von", "für", "auf", "ist", "sind",
            "ein", "eine", "einer", "eines", "einem", "einen", "den", "dem", "des", "im",
            "zu", "zum", "zur", "bei", "als", "auch", "sie", "wir", "ihr", "ihre", "nicht",
            "sowie", "über", "unter", "nach", "aus", "wie", "werden", "wird", "haben", "hat",
        ]
        .into_iter()
        .collect()
    }
}

/// Shorten text to `max_chars` characters, appending an ellipsis when cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenization() {
        let processor = TextProcessor::new();
        let tokens = processor.tokenize("Rust programming language is awesome!");

        assert!(tokens.contains(&"rust".to_string()));
        assert!(tokens.contains(&"programming".to_string()));
        assert!(tokens.contains(&"language".to_string()));
        assert!(tokens.contains(&"awesome".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
    }

    #[test]
    fn test_keeps_technical_terms() {
        let processor = TextProcessor::new();
        let tokens = processor.tokenize("Experience with C++, Node.js and CI-CD pipelines.");

        assert!(tokens.contains(&"c++".to_string()));
        assert!(tokens.contains(&"node.js".to_string()));
        assert!(tokens.contains(&"ci-cd".to_string()));
        assert!(tokens.contains(&"pipelines".to_string()));
    }

    #[test]
    fn test_trims_residual_punctuation() {
        let processor = TextProcessor::new();
        let tokens = processor.tokenize("...docker. -kubernetes- #terraform");

        assert_eq!(tokens, vec!["docker", "kubernetes", "terraform"]);
    }

    #[test]
    fn test_drops_short_tokens_and_stop_words() {
        let processor = TextProcessor::new();
        let tokens = processor.tokenize("We use Go and AI in the cloud und die Daten");

        assert_eq!(tokens, vec!["cloud", "daten"]);
    }

    #[test]
    fn test_empty_input() {
        let processor = TextProcessor::new();
        assert!(processor.tokenize("").is_empty());
        assert!(processor.tokenize("   \n\t ").is_empty());
        assert!(processor.split_sentences("").is_empty());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let processor = TextProcessor::new();
        let text = "Senior Backend Engineer (m/w/d)! Python, PostgreSQL & AWS; C#/.NET, node.js... 5+ years.";

        let tokens = processor.tokenize(text);
        let again = processor.tokenize(&tokens.join(" "));

        assert_eq!(tokens, again);
    }

    #[test]
    fn test_term_frequencies() {
        let processor = TextProcessor::new();
        let frequencies = processor.term_frequencies("Rust rust RUST python");

        assert_eq!(frequencies.get("rust"), Some(&3));
        assert_eq!(frequencies.get("python"), Some(&1));
    }

    #[test]
    fn test_sentence_split() {
        let processor = TextProcessor::new();
        let sentences = processor.split_sentences("Built APIs in Rust. Led a team of five!\nShipped weekly");

        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "Built APIs in Rust.");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_text("äöüäöü", 3), "äöü...");
    }
}
