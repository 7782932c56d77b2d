//! Document structures and resume section parsing

use crate::error::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest line (in characters) still considered a heading.
const MAX_HEADING_CHARS: usize = 60;
const MAX_HEADING_WORDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    Experience,
    Skills,
    Projects,
    Education,
    Location,
}

/// Heading pattern families, English and German. Table order decides ties.
pub const HEADING_FAMILIES: &[(SectionType, &str)] = &[
    (
        SectionType::Experience,
        r"(?i)\b(?:experience|employment|work\s+history|career|berufserfahrung|erfahrung|werdegang|beschäftigung)\b",
    ),
    (
        SectionType::Skills,
        r"(?i)\b(?:skills?|competenc(?:e|ies|y)|technolog(?:y|ies)|tech\s+stack|expertise|tools|kenntnisse|fähigkeiten|kompetenzen|technologien)\b",
    ),
    (
        SectionType::Projects,
        r"(?i)\b(?:projects?|portfolio|projekte?)\b",
    ),
    (
        SectionType::Education,
        r"(?i)\b(?:education|academic|qualifications?|degrees?|certifications?|studies|ausbildung|studium|bildung|weiterbildung|abschlüsse)\b",
    ),
    (
        SectionType::Location,
        r"(?i)\b(?:location|address|contact|personal\s+(?:details|information)|standort|wohnort|adresse|kontakt|persönliche\s+daten)\b",
    ),
];

/// Paragraph routing used when a resume has no recognizable headings.
pub const FALLBACK_FAMILIES: &[(SectionType, &str)] = &[
    (
        SectionType::Experience,
        r"(?i)\b(?:engineer|developer|manager|consultant|analyst|intern|architect|worked|working|responsible|led|managed|employed|company|gmbh|inc|ltd|entwickler|berater|tätig)\b",
    ),
    (
        SectionType::Skills,
        r"(?i)\b(?:python|java|javascript|typescript|rust|golang|sql|docker|kubernetes|aws|azure|gcp|react|node\.js|git|linux|terraform|excel|skills?|tools)\b",
    ),
    (
        SectionType::Education,
        r"(?i)\b(?:bachelor|master|phd|ph\.d|doctorate|degree|university|college|diploma|b\.sc|m\.sc|bsc|msc|mba|universität|hochschule|abitur|studium)\b",
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sections {
    pub experience: String,
    pub skills: String,
    pub projects: String,
    pub education: String,
    pub location: String,
}

impl Sections {
    pub fn get(&self, section_type: SectionType) -> &str {
        match section_type {
            SectionType::Experience => &self.experience,
            SectionType::Skills => &self.skills,
            SectionType::Projects => &self.projects,
            SectionType::Education => &self.education,
            SectionType::Location => &self.location,
        }
    }

    fn get_mut(&mut self, section_type: SectionType) -> &mut String {
        match section_type {
            SectionType::Experience => &mut self.experience,
            SectionType::Skills => &mut self.skills,
            SectionType::Projects => &mut self.projects,
            SectionType::Education => &mut self.education,
            SectionType::Location => &mut self.location,
        }
    }

    /// Education and location share one scoring bucket
    pub fn education_location(&self) -> String {
        join_non_empty(&[&self.education, &self.location], "\n")
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.experience,
            &self.skills,
            &self.projects,
            &self.education,
            &self.location,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }

    /// All section contents joined in a fixed order
    pub fn combined(&self) -> String {
        join_non_empty(
            &[
                &self.experience,
                &self.skills,
                &self.projects,
                &self.education,
                &self.location,
            ],
            "\n\n",
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    pub text: String,
    pub embedding: Option<Vec<f32>>,
}

impl JobDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvDocument {
    pub id: String,
    pub name: String,
    pub text: String,
    pub sections: Sections,
    pub embedding: Option<Vec<f32>>,
    pub updated_at: DateTime<Utc>,
}

impl CvDocument {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
        sections: Sections,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            text: text.into(),
            sections,
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    /// Build a resume from plain text, splitting it into sections
    pub fn from_text(
        id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
        parser: &SectionParser,
    ) -> Self {
        let text = text.into();
        let sections = parser.parse(&text);
        Self::new(id, name, text, sections)
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Text used for lexical comparison: the raw text, or the joined
    /// sections when only structured content was supplied
    pub fn searchable_text(&self) -> String {
        if self.text.trim().is_empty() {
            self.sections.combined()
        } else {
            self.text.clone()
        }
    }

    /// Raw text plus every section, for presence checks
    pub fn full_text(&self) -> String {
        join_non_empty(&[&self.text, &self.sections.combined()], "\n\n")
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.sections.is_empty()
    }
}

struct Heading<'l> {
    line_idx: usize,
    section_type: SectionType,
    /// Content sharing the heading line
    inline: Option<&'l str>,
}

/// Splits resume text into the five known sections
pub struct SectionParser {
    heading_families: Vec<(SectionType, Regex)>,
    fallback_families: Vec<(SectionType, Regex)>,
    paragraph_break: Regex,
}

impl SectionParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading_families: compile_families(HEADING_FAMILIES)?,
            fallback_families: compile_families(FALLBACK_FAMILIES)?,
            paragraph_break: Regex::new(r"\n[ \t]*\n")?,
        })
    }

    pub fn parse(&self, text: &str) -> Sections {
        let lines: Vec<&str> = text.lines().collect();
        let headings = self.detect_headings(&lines);

        if headings.is_empty() {
            log::debug!("No section headings found, routing paragraphs by keyword");
            return self.route_paragraphs(text);
        }

        let mut sections = Sections::default();
        for (position, heading) in headings.iter().enumerate() {
            let end = headings
                .get(position + 1)
                .map(|next| next.line_idx)
                .unwrap_or(lines.len());
            let body = heading
                .inline
                .iter()
                .copied()
                .chain(lines[heading.line_idx + 1..end].iter().copied())
                .collect::<Vec<_>>()
                .join("\n");
            *sections.get_mut(heading.section_type) = body.trim().to_string();
        }
        sections
    }

    /// Classify a single line as a section heading
    pub fn classify_heading(&self, line: &str) -> Option<SectionType> {
        let heading = normalize_heading(line)?;
        self.heading_families
            .iter()
            .find(|(_, pattern)| pattern.is_match(&heading))
            .map(|(section_type, _)| *section_type)
    }

    /// Inline heading such as `Skills: Python, Docker`, returning the section and
    /// the content after the colon
    pub fn classify_inline_heading<'l>(&self, line: &'l str) -> Option<(SectionType, &'l str)> {
        let (label, content) = line.split_once(':')?;
        let content = content.trim_start_matches(['*', '_']).trim();
        if content.is_empty() {
            return None;
        }
        let section_type = self.classify_heading(&format!("{}:", label))?;
        Some((section_type, content))
    }

    /// First heading line per section type, sorted by position
    fn detect_headings<'l>(&self, lines: &[&'l str]) -> Vec<Heading<'l>> {
        let mut headings: Vec<Heading<'l>> = Vec::new();
        for (line_idx, &line) in lines.iter().enumerate() {
            let found = match self.classify_inline_heading(line) {
                Some((section_type, content)) => Some((section_type, Some(content))),
                None => self
                    .classify_heading(line)
                    .map(|section_type| (section_type, None)),
            };
            if let Some((section_type, inline)) = found {
                if !headings.iter().any(|seen| seen.section_type == section_type) {
                    headings.push(Heading {
                        line_idx,
                        section_type,
                        inline,
                    });
                }
            }
        }
        headings.sort_by_key(|heading| heading.line_idx);
        headings
    }

    /// Paragraphs matching no family are dropped
    fn route_paragraphs(&self, text: &str) -> Sections {
        let mut sections = Sections::default();
        for paragraph in self.paragraph_break.split(text) {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let family = self
                .fallback_families
                .iter()
                .find(|(_, pattern)| pattern.is_match(paragraph));
            if let Some((section_type, _)) = family {
                let bucket = sections.get_mut(*section_type);
                if !bucket.is_empty() {
                    bucket.push_str("\n\n");
                }
                bucket.push_str(paragraph);
            }
        }
        sections
    }
}

fn compile_families(families: &[(SectionType, &str)]) -> Result<Vec<(SectionType, Regex)>> {
    families
        .iter()
        .map(|(section_type, pattern)| Ok((*section_type, Regex::new(pattern)?)))
        .collect()
}

/// Heading text with markdown and trailing colon removed, if the line looks like a heading
fn normalize_heading(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let is_markdown = trimmed.starts_with('#');
    let ends_with_colon = trimmed.trim_end_matches(['*', '_']).ends_with(':');
    let heading = trimmed
        .trim_start_matches(['#', '*', '_', ' ', '\t'])
        .trim_end_matches(['*', '_', ':', ' ', '\t'])
        .trim();

    if heading.is_empty()
        || heading.chars().count() > MAX_HEADING_CHARS
        || heading.split_whitespace().count() > MAX_HEADING_WORDS
        || heading.contains([',', ';'])
        || heading.ends_with(['.', '!', '?'])
    {
        return None;
    }

    let letters: Vec<char> = heading.chars().filter(|c| c.is_alphabetic()).collect();
    let first_letter = letters.first()?;
    let all_caps = letters.iter().all(|c| c.is_uppercase());

    if is_markdown || ends_with_colon || all_caps || first_letter.is_uppercase() {
        Some(heading.to_string())
    } else {
        None
    }
}

fn join_non_empty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionType::Experience => write!(f, "Experience"),
            SectionType::Skills => write!(f, "Skills"),
            SectionType::Projects => write!(f, "Projects"),
            SectionType::Education => write!(f, "Education"),
            SectionType::Location => write!(f, "Location"),
        }
    }
}
