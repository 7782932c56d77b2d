//! Must-have requirement extraction from job postings and gating checks against resumes.
//!
//! Extraction is table driven: every regex lives in [`MUST_HAVE_FAMILIES`],
//! tagged with the requirement category it feeds, so each family can be
//! exercised on its own.

use crate::error::Result;
use crate::processing::document::CvDocument;
use crate::processing::text_processor::TextProcessor;
use crate::processing::vocabulary::{contains_word, synonyms_for, TechVocabulary};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const MIN_FRAGMENT_CHARS: usize = 2;
const MAX_FRAGMENT_CHARS: usize = 40;
const MAX_FRAGMENT_WORDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MustHaveCategory {
    Skill,
    Language,
    Location,
    Clearance,
}

/// One named regex family feeding one requirement category
#[derive(Debug, Clone, Copy)]
pub struct PatternFamily {
    pub name: &'static str,
    pub category: MustHaveCategory,
    pub pattern: &'static str,
}

pub const MUST_HAVE_FAMILIES: &[PatternFamily] = &[
    // Skill lists after an explicit requirement marker, e.g. "Required: Python, AWS"
    PatternFamily {
        name: "required_list",
        category: MustHaveCategory::Skill,
        pattern: r"(?i)\b(?:required|mandatory|essential|requirements|must[\s-]haves?)(?:\s+(?:skills?|qualifications?|technologies|tech\s+stack))?\s*:\s*((?:[^\n.]|\.\S|\n[ \t]*[-*•·][ \t]*)+)",
    },
    // "must have experience with Rust and Tokio", "required knowledge of SQL"
    PatternFamily {
        name: "required_experience",
        category: MustHaveCategory::Skill,
        pattern: r"(?i)\b(?:must|required|essential|mandatory)\b[^\n.:]{0,40}?\b(?:skills?\s+(?:in|with)|experience\s+(?:with|in)|knowledge\s+(?:of|in)|proficiency\s+(?:in|with)|familiarity\s+with)\s+((?:[^\n.]|\.\S)+)",
    },
    PatternFamily {
        name: "fluent_in",
        category: MustHaveCategory::Language,
        pattern: r"(?i)\b(?:fluent|fluency|native|proficient|proficiency|business[\s-]level|excellent|strong)\s+(?:(?:in|with)\s+)?(?:(?:written|spoken)\s+(?:and\s+(?:written|spoken)\s+)?)?(english|german|french|spanish|italian|dutch|portuguese|polish|swedish|danish|norwegian|finnish|russian|ukrainian|czech|turkish|arabic|hebrew|hindi|chinese|mandarin|cantonese|japanese|korean|deutsch|englisch|französisch|spanisch)\b",
    },
    PatternFamily {
        name: "language_level",
        category: MustHaveCategory::Language,
        pattern: r"(?i)\b(english|german|french|spanish|italian|dutch|portuguese|polish|swedish|danish|norwegian|finnish|russian|ukrainian|czech|turkish|arabic|hebrew|hindi|chinese|mandarin|cantonese|japanese|korean|deutsch|englisch|französisch|spanisch)(?:\s+(?:level|niveau)\b|\s*\(?\s*([abc][12])\b)",
    },
    PatternFamily {
        name: "level_language",
        category: MustHaveCategory::Language,
        pattern: r"(?i)\b([abc][12])[\s-]+(?:level\s+)?(english|german|french|spanish|italian|dutch|portuguese|polish|swedish|danish|norwegian|finnish|russian|ukrainian|czech|turkish|arabic|hebrew|hindi|chinese|mandarin|cantonese|japanese|korean|deutsch|englisch|französisch|spanisch)\b",
    },
    PatternFamily {
        name: "language_word",
        category: MustHaveCategory::Language,
        pattern: r"(?i)\b(english|german|french|spanish|italian|dutch|portuguese|polish|swedish|danish|norwegian|finnish|russian|ukrainian|czech|turkish|arabic|hebrew|hindi|chinese|mandarin|cantonese|japanese|korean|deutsch|englisch|französisch|spanisch)[\s-]+(?:language|speaking|sprachkenntnisse|kenntnisse)\b",
    },
    PatternFamily {
        name: "speak_know",
        category: MustHaveCategory::Language,
        pattern: r"(?i)\b(?:speak|speaks|speaking|know|knows|sprechen|sprichst)\s+(english|german|french|spanish|italian|dutch|portuguese|polish|swedish|danish|norwegian|finnish|russian|ukrainian|czech|turkish|arabic|hebrew|hindi|chinese|mandarin|cantonese|japanese|korean|deutsch|englisch|französisch|spanisch)\b",
    },
    PatternFamily {
        name: "must_be_in",
        category: MustHaveCategory::Location,
        pattern: r"(?i)\bmust\s+(?:be\s+(?:located\s+|based\s+)?|live\s+|reside\s+)in\s+([^\n.,;()]+)",
    },
    PatternFamily {
        name: "work_mode",
        category: MustHaveCategory::Location,
        pattern: r"(?i)\b(remote|on-?site|hybrid)\b",
    },
    PatternFamily {
        name: "security_clearance",
        category: MustHaveCategory::Clearance,
        pattern: r"(?i)\b(?:(?:active|valid|current)\s+)?(?:top\s+secret|ts/sci|secret|sc|dv|nv1|nv2|baseline|security)\s+clearance\b",
    },
    PatternFamily {
        name: "work_permit",
        category: MustHaveCategory::Clearance,
        pattern: r"(?i)\b(?:valid\s+)?(?:(?:eu|uk|us)\s+)?work\s+(?:permit|authori[sz]ation|visa)\b|\barbeitserlaubnis\b",
    },
    PatternFamily {
        name: "visa",
        category: MustHaveCategory::Clearance,
        pattern: r"(?i)\b(?:h-?1b|blue\s+card|valid\s+visa)\b",
    },
    PatternFamily {
        name: "citizenship",
        category: MustHaveCategory::Clearance,
        pattern: r"(?i)\b(?:(?:us|eu|uk|german|british|canadian|australian)\s+)?citizen(?:ship)?\b",
    },
];

/// Words marking a sentence as stating hard requirements.
const MARKER_PATTERN: &str =
    r"(?i)\b(?:must|required|essential|mandatory|erforderlich|zwingend|vorausgesetzt|voraussetzung)\b";

/// Negation closing the clause before a clearance hit, within three words:
/// "we do not require a work permit", "keine Arbeitserlaubnis".
const NEGATION_PATTERN: &str =
    r"(?i)\b(?:not|no|never|without|don't|doesn't|nicht|kein|keine|keinen|ohne)\b(?:[\s-]+[\w'’]+){0,3}[\s-]*$";

/// Separators between list items.
const LIST_SEPARATOR_PATTERN: &str = r"[,;\n•·|]|\s+(?:and|&|und)\s+|(?:^|\s)[-*]\s";

/// Alternatives inside one requirement, e.g. "Java or Kotlin".
const ALTERNATIVE_PATTERN: &str = r"(?i)\s+(?:or|oder)\s+";

/// Leading filler stripped from list fragments.
const FRAGMENT_PREFIXES: &[&str] = &["and ", "or ", "with ", "in ", "e.g. ", "like ", "including "];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MustHaveSet {
    pub required_skills: Vec<String>,
    pub language: Option<String>,
    pub location: Option<String>,
    pub clearance: Vec<String>,
}

impl MustHaveSet {
    pub fn is_empty(&self) -> bool {
        self.required_skills.is_empty()
            && self.language.is_none()
            && self.location.is_none()
            && self.clearance.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MustHaveReport {
    pub satisfied: bool,
    pub missing: Vec<String>,
}

impl MustHaveReport {
    fn from_missing(missing: Vec<String>) -> Self {
        Self {
            satisfied: missing.is_empty(),
            missing,
        }
    }
}

impl Default for MustHaveReport {
    fn default() -> Self {
        Self::from_missing(Vec::new())
    }
}

/// Derives a [`MustHaveSet`] from job posting text
pub struct MustHaveExtractor {
    families: Vec<(PatternFamily, Regex)>,
    marker: Regex,
    negation: Regex,
    list_separator: Regex,
    processor: TextProcessor,
    vocabulary: TechVocabulary,
}

impl MustHaveExtractor {
    pub fn new() -> Result<Self> {
        let families = MUST_HAVE_FAMILIES
            .iter()
            .map(|family| Ok((*family, Regex::new(family.pattern)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            families,
            marker: Regex::new(MARKER_PATTERN)?,
            negation: Regex::new(NEGATION_PATTERN)?,
            list_separator: Regex::new(LIST_SEPARATOR_PATTERN)?,
            processor: TextProcessor::new(),
            vocabulary: TechVocabulary::new()?,
        })
    }

    pub fn extract(&self, job_text: &str) -> MustHaveSet {
        let must_haves = MustHaveSet {
            required_skills: self.extract_skills(job_text),
            language: self.extract_language(job_text),
            location: self.extract_location(job_text),
            clearance: self.clearance_hits(job_text),
        };
        log::debug!(
            "Extracted {} required skills, language {:?}, location {:?}, {} clearance hits",
            must_haves.required_skills.len(),
            must_haves.language,
            must_haves.location,
            must_haves.clearance.len()
        );
        must_haves
    }

    /// Raw capture-group texts of one named family, in match order
    pub fn family_captures(&self, name: &str, text: &str) -> Vec<Vec<String>> {
        self.families
            .iter()
            .filter(|(family, _)| family.name == name)
            .flat_map(|(_, pattern)| pattern.captures_iter(text))
            .map(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|group| group.as_str().trim().to_string())
                    .collect()
            })
            .collect()
    }

    fn extract_skills(&self, text: &str) -> Vec<String> {
        let mut skills = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |skill: String| {
            if seen.insert(skill.to_lowercase()) {
                skills.push(skill);
            }
        };

        for (family, pattern) in &self.families {
            if family.category != MustHaveCategory::Skill {
                continue;
            }
            for captures in pattern.captures_iter(text) {
                if let Some(list) = captures.get(1) {
                    for fragment in self.split_fragments(list.as_str()) {
                        push(fragment);
                    }
                }
            }
        }

        for sentence in self.processor.split_sentences(text) {
            if self.marker.is_match(&sentence) {
                for term in self.vocabulary.find_skill_terms(&sentence) {
                    push(term.to_string());
                }
            }
        }

        skills
    }

    /// Split a captured list into short, skill-like fragments
    fn split_fragments(&self, list: &str) -> Vec<String> {
        self.list_separator
            .split(list)
            .filter_map(clean_fragment)
            .collect()
    }

    fn extract_language(&self, text: &str) -> Option<String> {
        self.families
            .iter()
            .filter(|(family, _)| family.category == MustHaveCategory::Language)
            .find_map(|(_, pattern)| pattern.captures(text))
            .map(|captures| {
                let mut languages = Vec::new();
                let mut levels = Vec::new();
                for group in captures.iter().skip(1).flatten() {
                    let value = group.as_str().trim();
                    if is_cefr_level(value) {
                        levels.push(value.to_uppercase());
                    } else {
                        languages.push(capitalize(value));
                    }
                }
                languages.extend(levels);
                languages.join(" ")
            })
    }

    fn extract_location(&self, text: &str) -> Option<String> {
        let explicit = self
            .family_captures("must_be_in", text)
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty());
        if explicit.is_some() {
            return explicit;
        }

        self.family_captures("work_mode", text)
            .into_iter()
            .flatten()
            .next()
            .map(|mode| normalize_work_mode(&mode))
    }

    /// Full-match texts of every clearance family, duplicates kept, negated mentions skipped
    fn clearance_hits(&self, text: &str) -> Vec<String> {
        self.families
            .iter()
            .filter(|(family, _)| family.category == MustHaveCategory::Clearance)
            .flat_map(|(_, pattern)| pattern.find_iter(text))
            .filter(|m| {
                let negated = self.is_negated(text, m.start());
                if negated {
                    log::debug!("Skipping negated clearance mention '{}'", m.as_str());
                }
                !negated
            })
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }

    fn is_negated(&self, text: &str, start: usize) -> bool {
        let prefix = &text[..start];
        let clause = prefix
            .rsplit(['.', ';', '!', '?', '\n'])
            .next()
            .unwrap_or(prefix);
        self.negation.is_match(clause)
    }
}

/// Checks a resume against extracted must-haves
pub struct MustHaveChecker {
    alternatives: Regex,
}

impl MustHaveChecker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            alternatives: Regex::new(ALTERNATIVE_PATTERN)?,
        })
    }

    /// Missing skills and clearances are reported verbatim. The language check
    /// only looks for the first word of the language and location is never enforced.
    pub fn check(&self, must_haves: &MustHaveSet, cv: &CvDocument) -> MustHaveReport {
        let full_text = cv.full_text().to_lowercase();
        let skills_text = cv.sections.skills.to_lowercase();
        let mut missing = Vec::new();

        for skill in &must_haves.required_skills {
            if !self.has_skill(skill, &full_text, &skills_text) {
                missing.push(skill.clone());
            }
        }

        if let Some(language) = &must_haves.language {
            let first_word = language
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if !first_word.is_empty() && !full_text.contains(&first_word) {
                missing.push(language.clone());
            }
        }

        if let Some(location) = &must_haves.location {
            log::debug!("Location requirement '{}' recorded, not enforced", location);
        }

        for clearance in &must_haves.clearance {
            if !full_text.contains(&clearance.to_lowercase()) {
                missing.push(clearance.clone());
            }
        }

        MustHaveReport::from_missing(missing)
    }

    /// Any alternative ("Java or Kotlin") present verbatim or through a synonym
    fn has_skill(&self, skill: &str, full_text: &str, skills_text: &str) -> bool {
        self.alternatives.split(skill).any(|alternative| {
            let needle = alternative.trim().to_lowercase();
            if needle.is_empty() {
                return false;
            }
            if full_text.contains(&needle) || skills_text.contains(&needle) {
                return true;
            }
            synonyms_for(&needle).map_or(false, |group| {
                group
                    .iter()
                    .any(|synonym| contains_word(full_text, synonym) || contains_word(skills_text, synonym))
            })
        })
    }
}

fn clean_fragment(raw: &str) -> Option<String> {
    let mut fragment = raw
        .trim()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '"' | '\'' | '(' | ')' | ':'))
        .to_string();

    while let Some(prefix) = FRAGMENT_PREFIXES.iter().find(|prefix| {
        fragment
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
    }) {
        fragment = fragment[prefix.len()..].trim_start().to_string();
    }
    for suffix in [" etc.", " etc"] {
        let cut = fragment.len().saturating_sub(suffix.len());
        if fragment.get(cut..).map_or(false, |tail| tail.eq_ignore_ascii_case(suffix)) {
            fragment.truncate(cut);
        }
    }
    let fragment = fragment.trim().to_string();
    let lowered = fragment.to_lowercase();

    let chars = fragment.chars().count();
    let words = fragment.split_whitespace().count();
    let starts_with_digit = fragment.chars().next().map_or(true, |c| c.is_ascii_digit());
    let looks_like_duration = lowered.contains("year") || lowered.contains("jahre");

    if (MIN_FRAGMENT_CHARS..=MAX_FRAGMENT_CHARS).contains(&chars)
        && words <= MAX_FRAGMENT_WORDS
        && !fragment.contains(['?', '!'])
        && !starts_with_digit
        && !looks_like_duration
    {
        Some(fragment)
    } else {
        None
    }
}

fn is_cefr_level(value: &str) -> bool {
    let lowered = value.to_lowercase();
    matches!(lowered.as_str(), "a1" | "a2" | "b1" | "b2" | "c1" | "c2")
}

fn capitalize(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn normalize_work_mode(mode: &str) -> String {
    match mode.to_lowercase().as_str() {
        "remote" => "Remote".to_string(),
        "hybrid" => "Hybrid".to_string(),
        _ => "On-site".to_string(),
    }
}
