use crate::catalog::{normalize_text, EntityCatalog, EntityKind};
use strsim::jaro_winkler;

/// Fuzzy matcher for entity names with spelling variations
pub struct FuzzyMatcher {
    /// Similarity threshold (0.0-1.0) for considering two strings as matches
    pub similarity_threshold: f64,
    /// Maximum number of suggestions returned for one phrase
    pub max_suggestions: usize,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            max_suggestions: 3,
        }
    }
}

impl FuzzyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self {
            similarity_threshold: threshold,
            ..Self::default()
        }
    }

    /// Calculate similarity between two strings
    /// Returns a score between 0.0 and 1.0 (higher = more similar)
    pub fn similarity(&self, s1: &str, s2: &str) -> f64 {
        let norm1 = normalize_text(s1);
        let norm2 = normalize_text(s2);
        if norm1.is_empty() || norm2.is_empty() {
            return 0.0;
        }

        let jw_score = jaro_winkler(&norm1, &norm2);

        // Small bonus when one contains the other ("bengal" vs "west bengal")
        let is_substring = norm1.contains(&norm2) || norm2.contains(&norm1);
        let substring_bonus = if is_substring {
            let len_diff = (norm1.len() as f64 - norm2.len() as f64).abs();
            let max_len = norm1.len().max(norm2.len()) as f64;
            (1.0 - (len_diff / max_len)) * 0.1
        } else {
            0.0
        };

        (jw_score + substring_bonus).min(1.0)
    }

    /// Catalog names close to an unrecognized phrase, best first.
    ///
    /// Ties are broken by name so suggestions are reproducible.
    pub fn suggest(&self, catalog: &EntityCatalog, phrase: &str) -> Vec<(EntityKind, String)> {
        let mut scored: Vec<(f64, EntityKind, &str)> = catalog
            .canonical_names()
            .into_iter()
            .map(|(kind, name)| (self.similarity(phrase, name), kind, name))
            .filter(|(score, _, _)| *score >= self.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.2.cmp(b.2))
        });

        scored
            .into_iter()
            .take(self.max_suggestions)
            .map(|(_, kind, name)| (kind, name.to_string()))
            .collect()
    }
}
