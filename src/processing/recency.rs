//! Experience recency decay

use crate::error::Result;
use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const RECENT_FACTOR: f32 = 1.0;
pub const MODERATE_FACTOR: f32 = 0.7;
pub const STALE_FACTOR: f32 = 0.4;
/// Experience text without any recognizable date.
pub const NO_DATES_FACTOR: f32 = 0.7;
/// No experience text at all.
pub const NO_SECTION_FACTOR: f32 = 0.4;

const RECENT_YEARS: i32 = 2;
const MODERATE_YEARS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFamily {
    /// `2019 - 2021`, `2022 – present`, `2020 bis heute`
    YearRange,
    /// `2021`, `03/2021`, `Mar 2021`
    SingleYear,
    /// `since 2018`, `- present`; both resolve to the reference year
    OpenEnded,
}

pub const DATE_FAMILIES: &[(DateFamily, &str)] = &[
    (
        DateFamily::YearRange,
        r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to|bis)\s*((?:19|20)\d{2}|present|current|now|today|ongoing|heute|aktuell|jetzt)\b",
    ),
    (
        DateFamily::SingleYear,
        r"\b(?:(?:0?[1-9]|1[0-2])[/.])?((?:19|20)\d{2})\b",
    ),
    (
        DateFamily::OpenEnded,
        r"(?i)\b(since|seit)\s+(?:[a-zäöü]+\.?\s+)?(?:19|20)\d{2}\b|(?:-|–|—|\bto|\bbis)\s*(present|current|now|today|ongoing|heute|aktuell|jetzt)\b",
    ),
];

/// Maps the latest year mentioned in experience text to a freshness multiplier
pub struct RecencyDecay {
    families: Vec<(DateFamily, Regex)>,
    reference_year: i32,
}

impl RecencyDecay {
    /// Decay evaluated against the current UTC year
    pub fn new() -> Result<Self> {
        Self::with_reference_year(Utc::now().year())
    }

    pub fn with_reference_year(reference_year: i32) -> Result<Self> {
        let families = DATE_FAMILIES
            .iter()
            .map(|(family, pattern)| Ok((*family, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            families,
            reference_year,
        })
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Years found by one pattern family; present-like tokens resolve to the reference year
    pub fn years_in_family(&self, family: DateFamily, text: &str) -> Vec<i32> {
        let Some((_, pattern)) = self.families.iter().find(|(f, _)| *f == family) else {
            return Vec::new();
        };

        let mut years = Vec::new();
        for captures in pattern.captures_iter(text) {
            for group in captures.iter().skip(1).flatten() {
                if let Some(year) = self.resolve_year(group.as_str()) {
                    years.push(year);
                }
            }
        }
        years
    }

    /// Latest end year mentioned anywhere in the text
    pub fn latest_year(&self, text: &str) -> Option<i32> {
        self.families
            .iter()
            .flat_map(|(family, _)| self.years_in_family(*family, text))
            .max()
    }

    /// Freshness multiplier for an experience section
    pub fn factor(&self, experience: &str) -> f32 {
        if experience.trim().is_empty() {
            return NO_SECTION_FACTOR;
        }

        match self.latest_year(experience) {
            None => NO_DATES_FACTOR,
            Some(latest) => {
                let years_ago = (self.reference_year - latest).max(0);
                if years_ago <= RECENT_YEARS {
                    RECENT_FACTOR
                } else if years_ago <= MODERATE_YEARS {
                    MODERATE_FACTOR
                } else {
                    STALE_FACTOR
                }
            }
        }
    }

    fn resolve_year(&self, token: &str) -> Option<i32> {
        match token.parse::<i32>() {
            Ok(year) => Some(year),
            Err(_) if is_present_token(token) => Some(self.reference_year),
            Err(_) => None,
        }
    }
}

fn is_present_token(token: &str) -> bool {
    matches!(
        token.to_lowercase().as_str(),
        "present" | "current" | "now" | "today" | "ongoing" | "heute" | "aktuell" | "jetzt" | "since" | "seit"
    )
}
