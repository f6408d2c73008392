//! Detection of unrecognized entity mentions and construction of
//! clarification requests.

use crate::catalog::{contains_phrase, normalize_text, EntityCatalog, EntityKind, EntityMatch};
use crate::fuzzy_matcher::FuzzyMatcher;
use crate::intent::{ClarificationRequest, MissingPiece};
use crate::rules::Requirement;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    static ref AFTER_PREPOSITION: Regex = Regex::new(
        r"\b(?:in|for|of|across|between|and|versus|vs)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*)"
    )
    .unwrap();
    static ref BEFORE_PLACE_NOUN: Regex =
        Regex::new(r"([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*)\s+(?:district|districts|state)\b").unwrap();
    static ref LOWERCASE_AFTER_PREPOSITION: Regex =
        Regex::new(r"\b(?:in|for|of|across|between|and|versus|vs)\s+([a-z]+)(?:\s+([a-z]+))?").unwrap();
    static ref STOP_WORDS: HashSet<&'static str> = [
        "which", "what", "where", "when", "how", "why", "who", "is", "are", "was", "the", "a",
        "an", "each", "every", "that", "this", "these", "those", "any", "all", "both", "top",
        "bottom", "highest", "lowest", "last", "past", "recent", "most", "least", "average",
        "total", "rainfall", "rain", "production", "crop", "crops", "compare", "give", "show",
        "list", "tell", "me", "please", "year", "years", "decade", "trend", "district",
        "districts", "state", "states", "data", "january", "february", "march", "april", "may",
        "june", "july", "august", "september", "october", "november", "december", "jan", "feb",
        "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "my", "our",
        "government", "policy", "annual", "monsoon",
    ]
    .into_iter()
    .collect();
}

pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "What is the average Wheat production in Karnataka over the last 3 years?",
    "Compare rainfall in Punjab and Haryana",
    "Which state has the highest Sugarcane production?",
    "How has Rice production changed in West Bengal over the last decade?",
    "Give arguments to promote drought-resistant crops in Maharashtra",
];

pub struct AmbiguityResolver {
    catalog: Arc<EntityCatalog>,
    matcher: FuzzyMatcher,
}

impl AmbiguityResolver {
    pub fn new(catalog: Arc<EntityCatalog>) -> Self {
        Self {
            catalog,
            matcher: FuzzyMatcher::default(),
        }
    }

    /// Capitalized phrases in place-like positions that match nothing in the
    /// catalog. `recognized` are the matches already found in `normalized`.
    pub fn unrecognized_mentions(
        &self,
        raw_text: &str,
        normalized: &str,
        recognized: &[EntityMatch],
    ) -> Vec<String> {
        let recognized_surfaces: Vec<&str> = recognized
            .iter()
            .filter_map(|m| normalized.get(m.start..m.end))
            .collect();

        let candidates = AFTER_PREPOSITION
            .captures_iter(raw_text)
            .chain(BEFORE_PLACE_NOUN.captures_iter(raw_text))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()));

        let mut unknown: Vec<String> = Vec::new();
        for candidate in candidates {
            let Some(phrase) = strip_stop_words(&candidate) else {
                continue;
            };
            let norm = normalize_text(&phrase);
            if self.catalog.is_ignored(&phrase) || self.catalog.is_ignored(&candidate) {
                continue;
            }
            let covered = recognized_surfaces
                .iter()
                .any(|surface| contains_phrase(surface, &norm) || contains_phrase(&norm, surface))
                || !self.catalog.scan(&norm).is_empty();
            if !covered && !unknown.contains(&phrase) {
                unknown.push(phrase);
            }
        }
        unknown
    }

    /// Piece for an unknown name. Suggestions stay in their own field; the
    /// formatter phrases them.
    pub fn unrecognized_piece(&self, phrase: &str) -> MissingPiece {
        let suggestions: Vec<String> = self
            .matcher
            .suggest(&self.catalog, phrase)
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        MissingPiece {
            field: "entity".to_string(),
            description: format!("I don't recognize '{}' as a state, district or crop.", phrase),
            suggestions,
        }
    }

    /// True when an unknown mention sits where `requirement` would be met.
    /// Mentions are found in place positions, so they stand in for a state;
    /// they stand in for a crop only when they resemble one.
    pub fn covers(&self, phrase: &str, requirement: Requirement) -> bool {
        match requirement {
            Requirement::State | Requirement::StateOrCrop => true,
            Requirement::Crop => self
                .matcher
                .suggest(&self.catalog, phrase)
                .iter()
                .any(|(kind, _)| matches!(kind, EntityKind::Crop | EntityKind::CropGroup)),
        }
    }

    /// Missing-entity piece, with suggestions drawn from lowercase words that
    /// sit where a place or crop name would normally go.
    pub fn requirement_piece(&self, requirement: Requirement, residual: &str) -> MissingPiece {
        let mut suggestions: Vec<String> = Vec::new();
        for caps in LOWERCASE_AFTER_PREPOSITION.captures_iter(residual) {
            let first = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let pair = caps.get(2).map(|second| format!("{} {}", first, second.as_str()));
            for phrase in pair.iter().map(String::as_str).chain(std::iter::once(first)) {
                if phrase.split(' ').all(|w| STOP_WORDS.contains(w)) {
                    continue;
                }
                for (_, name) in self.matcher.suggest(&self.catalog, phrase) {
                    if !suggestions.contains(&name) {
                        suggestions.push(name);
                    }
                }
            }
        }
        suggestions.truncate(self.matcher.max_suggestions);

        MissingPiece {
            field: requirement.field().to_string(),
            description: format!("Please name {} for this question.", requirement.describe()),
            suggestions,
        }
    }

    pub fn unresolved_years_piece(&self, reason: &str) -> MissingPiece {
        MissingPiece {
            field: "year_range".to_string(),
            description: format!("Which years should I use? {}.", reason),
            suggestions: vec!["last 5 years".to_string(), "2015 to 2020".to_string()],
        }
    }

    pub fn unclassified_piece(&self) -> MissingPiece {
        MissingPiece {
            field: "question_type".to_string(),
            description: "I couldn't tell what kind of analysis you want.".to_string(),
            suggestions: Vec::new(),
        }
    }

    /// One request covering every missing piece. The question stays short;
    /// the pieces carry the details.
    pub fn build_request(&self, missing_pieces: Vec<MissingPiece>) -> ClarificationRequest {
        let question = match missing_pieces.len() {
            0 | 1 => "Could you clarify your question?".to_string(),
            n => format!("Could you clarify {} things about your question?", n),
        };
        ClarificationRequest {
            question,
            missing_pieces,
            examples: EXAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        }
    }
}

/// Drop stop words; `None` when nothing is left.
fn strip_stop_words(candidate: &str) -> Option<String> {
    let kept: Vec<&str> = candidate
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w.to_lowercase().as_str()))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}
