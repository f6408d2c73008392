//! Ordered classification table.
//!
//! Rules are evaluated top to bottom; the first rule whose keyword groups all
//! hit and whose entity gate holds decides the category. The table is data so
//! each rule can be tested on its own.

use crate::catalog::contains_phrase;
use crate::intent::QueryCategory;

pub const RAINFALL_WORDS: &[&str] = &[
    "rain",
    "rains",
    "rainfall",
    "precipitation",
    "monsoon",
    "climate",
    "wet",
    "wetter",
    "drier",
];

pub const PRODUCTION_WORDS: &[&str] = &[
    "production",
    "produce",
    "produced",
    "produces",
    "producing",
    "producer",
    "producers",
    "output",
    "yield",
    "yields",
    "harvest",
    "grown",
    "grow",
    "cultivation",
];

pub const HIGHEST_WORDS: &[&str] = &[
    "highest", "top", "most", "maximum", "max", "largest", "biggest", "greatest", "best", "leading",
    "higher", "more",
];

pub const LOWEST_WORDS: &[&str] = &[
    "lowest", "bottom", "least", "minimum", "min", "smallest", "worst", "fewest", "lower", "less",
];

const RANKING_WORDS: &[&str] = &[
    "highest", "lowest", "top", "bottom", "most", "least", "maximum", "minimum", "max", "min",
    "largest", "smallest", "biggest", "best", "worst", "leading", "rank", "ranking", "ranked",
];

const COMPARISON_WORDS: &[&str] = &[
    "compare",
    "compared",
    "comparing",
    "comparison",
    "versus",
    "vs",
    "difference",
    "differ",
    "between",
    "against",
    "contrast",
    "than",
];

const CORRELATION_WORDS: &[&str] = &[
    "correlation",
    "correlate",
    "correlated",
    "correlates",
    "relationship",
    "relation",
    "related",
    "impact",
    "affect",
    "affects",
    "affected",
    "effect",
    "influence",
    "depend",
    "depends",
    "linked",
];

const POLICY_WORDS: &[&str] = &[
    "policy",
    "policies",
    "scheme",
    "schemes",
    "promote",
    "promoting",
    "promotion",
    "argument",
    "arguments",
    "incentivize",
    "incentivise",
    "encourage",
    "subsidy",
    "subsidies",
    "justify",
    "case for",
    "recommend",
];

const TREND_WORDS: &[&str] = &[
    "trend",
    "trends",
    "over time",
    "over the years",
    "growth",
    "changed",
    "change",
    "changes",
    "increase",
    "increased",
    "increasing",
    "decrease",
    "decreased",
    "decreasing",
    "decline",
    "declined",
    "declining",
    "trajectory",
    "year on year",
    "year over year",
    "pattern",
];

/// Entities that must be present once a rule has matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    State,
    Crop,
    StateOrCrop,
}

impl Requirement {
    pub fn describe(&self) -> &'static str {
        match self {
            Requirement::State => "a state",
            Requirement::Crop => "a crop",
            Requirement::StateOrCrop => "a state or a crop",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Requirement::State => "state",
            Requirement::Crop => "crop",
            Requirement::StateOrCrop => "state_or_crop",
        }
    }
}

/// Entity counts the classifier sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    pub states: usize,
    pub districts: usize,
    pub crops: usize,
}

impl EntityCounts {
    /// Largest group of same-kind entities that could be compared.
    pub fn comparable(&self) -> usize {
        self.states.max(self.crops).max(self.districts)
    }

    pub fn satisfies(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::State => self.states > 0,
            Requirement::Crop => self.crops > 0,
            Requirement::StateOrCrop => self.states > 0 || self.crops > 0 || self.districts > 0,
        }
    }
}

#[derive(Debug)]
pub struct ClassificationRule {
    pub category: QueryCategory,
    /// Every group needs at least one of its keywords in the question.
    pub keyword_groups: &'static [&'static [&'static str]],
    /// Any of these vetoes the rule.
    pub excluded: &'static [&'static str],
    pub min_states: usize,
    /// Minimum of `EntityCounts::comparable`.
    pub min_comparable: usize,
    pub requires: Option<Requirement>,
}

impl ClassificationRule {
    /// Keyword groups and entity gate, without the requirement check.
    pub fn matches(&self, normalized: &str, counts: &EntityCounts) -> bool {
        let keywords_hit = self
            .keyword_groups
            .iter()
            .all(|group| contains_any(normalized, group));
        let vetoed = contains_any(normalized, self.excluded);
        keywords_hit
            && !vetoed
            && counts.states >= self.min_states
            && counts.comparable() >= self.min_comparable
    }

    /// The first requirement the entities do not meet.
    pub fn unmet_requirement(&self, counts: &EntityCounts) -> Option<Requirement> {
        self.requires.filter(|req| !counts.satisfies(*req))
    }
}

pub static RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: QueryCategory::PolicySupport,
        keyword_groups: &[POLICY_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::State),
    },
    ClassificationRule {
        category: QueryCategory::RainfallComparison,
        keyword_groups: &[RAINFALL_WORDS],
        excluded: CORRELATION_WORDS,
        min_states: 2,
        min_comparable: 2,
        requires: None,
    },
    ClassificationRule {
        category: QueryCategory::CorrelationQuery,
        keyword_groups: &[CORRELATION_WORDS, RAINFALL_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::Crop),
    },
    ClassificationRule {
        category: QueryCategory::DistrictRanking,
        keyword_groups: &[&["district", "districts"], RANKING_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::Crop),
    },
    ClassificationRule {
        category: QueryCategory::StateRanking,
        keyword_groups: &[&["state", "states"], RANKING_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::Crop),
    },
    ClassificationRule {
        category: QueryCategory::TrendAnalysis,
        keyword_groups: &[TREND_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::StateOrCrop),
    },
    ClassificationRule {
        category: QueryCategory::ProductionComparison,
        keyword_groups: &[COMPARISON_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 2,
        requires: None,
    },
    ClassificationRule {
        category: QueryCategory::RainfallQuery,
        keyword_groups: &[RAINFALL_WORDS],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::State),
    },
    ClassificationRule {
        category: QueryCategory::ProductionQuery,
        keyword_groups: &[],
        excluded: &[],
        min_states: 0,
        min_comparable: 0,
        requires: Some(Requirement::StateOrCrop),
    },
];

/// First rule that matches, if any. The catch-all makes `None` impossible
/// with the built-in table, but a custom table may leave gaps.
pub fn first_match<'a>(
    rules: &'a [ClassificationRule],
    normalized: &str,
    counts: &EntityCounts,
) -> Option<&'a ClassificationRule> {
    rules.iter().find(|rule| rule.matches(normalized, counts))
}

pub fn contains_any(normalized: &str, words: &[&str]) -> bool {
    words.iter().any(|w| contains_phrase(normalized, w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(states: usize, crops: usize) -> EntityCounts {
        EntityCounts {
            states,
            districts: 0,
            crops,
        }
    }

    fn classify(text: &str, c: EntityCounts) -> QueryCategory {
        first_match(RULES, text, &c).unwrap().category
    }

    #[test]
    fn test_catch_all_is_last() {
        let last = RULES.last().unwrap();
        assert_eq!(last.category, QueryCategory::ProductionQuery);
        assert!(last.keyword_groups.is_empty());
        assert!(first_match(RULES, "", &EntityCounts::default()).is_some());
    }

    #[test]
    fn test_policy_rule() {
        let text = "arguments to promote drought resistant crops in karnataka";
        assert_eq!(classify(text, counts(1, 0)), QueryCategory::PolicySupport);
    }

    #[test]
    fn test_rainfall_comparison_needs_two_states() {
        let text = "compare rainfall in punjab and haryana";
        assert_eq!(classify(text, counts(2, 0)), QueryCategory::RainfallComparison);
        // One state falls through to the single-entity rule.
        assert_eq!(classify("compare rainfall in punjab", counts(1, 0)), QueryCategory::RainfallQuery);
    }

    #[test]
    fn test_correlation_rule() {
        let text = "how does rainfall affect rice production in punjab";
        assert_eq!(classify(text, counts(1, 1)), QueryCategory::CorrelationQuery);
        // Correlation wording vetoes the comparison even with two states.
        let text = "correlation between rainfall and rice in punjab and haryana";
        assert_eq!(classify(text, counts(2, 1)), QueryCategory::CorrelationQuery);
    }

    #[test]
    fn test_ranking_rules() {
        let text = "which state has the highest sugarcane production";
        assert_eq!(classify(text, counts(0, 1)), QueryCategory::StateRanking);
        let text = "top 5 districts for wheat in punjab";
        assert_eq!(classify(text, counts(1, 1)), QueryCategory::DistrictRanking);
    }

    #[test]
    fn test_trend_rule() {
        let text = "how has rice production changed in punjab";
        assert_eq!(classify(text, counts(1, 1)), QueryCategory::TrendAnalysis);
    }

    #[test]
    fn test_comparison_tie_break() {
        let text = "compare wheat production in punjab and haryana";
        assert_eq!(classify(text, counts(2, 1)), QueryCategory::ProductionComparison);
        let text = "compare wheat and rice in punjab";
        assert_eq!(classify(text, counts(1, 2)), QueryCategory::ProductionComparison);
        // Single entity: the single-entity rule wins.
        let text = "compare wheat production in punjab";
        assert_eq!(classify(text, counts(1, 1)), QueryCategory::ProductionQuery);
    }

    #[test]
    fn test_requirements() {
        let rule = RULES
            .iter()
            .find(|r| r.category == QueryCategory::StateRanking)
            .unwrap();
        assert_eq!(rule.unmet_requirement(&counts(0, 0)), Some(Requirement::Crop));
        assert_eq!(rule.unmet_requirement(&counts(0, 1)), None);
    }

    #[test]
    fn test_multi_word_keywords() {
        assert!(contains_any("rice output over the years", TREND_WORDS));
        assert!(!contains_any("rainy season", RAINFALL_WORDS));
    }
}
