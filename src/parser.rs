//! Question parser: raw text to [`QueryIntent`].
//!
//! Deterministic and model-free. Steps:
//! 1. normalize the text (the raw string is kept on the intent)
//! 2. pull year references out and blank them
//! 3. scan the rest for catalog entities, longest match first
//! 4. classify with the ordered rule table
//! 5. downgrade to `clarification` when anything is unresolved

use crate::ambiguity::AmbiguityResolver;
use crate::catalog::{contains_phrase, normalize_text, EntityCatalog, EntityKind};
use crate::intent::{Aggregation, CropFocus, Measure, QueryCategory, QueryIntent, RankingFocus};
use crate::rules::{
    self, contains_any, ClassificationRule, EntityCounts, HIGHEST_WORDS, LOWEST_WORDS,
    PRODUCTION_WORDS, RAINFALL_WORDS,
};
use crate::time::{count_from_token, extract_years};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref TOP_N_AFTER: Regex = Regex::new(
        r"\b(?:top|bottom|best|worst|highest|lowest|leading|largest|smallest)\s+(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten)\b"
    )
    .unwrap();
    static ref TOP_N_BEFORE: Regex = Regex::new(
        r"\b(\d{1,2}|two|three|four|five|six|seven|eight|nine|ten)\s+(?:highest|lowest|top|bottom|best|worst|leading|largest|smallest|major|biggest)\b"
    )
    .unwrap();
    static ref ARGUMENT_COUNT: Regex = Regex::new(
        r"\b(\d{1,2}|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?:\w+\s+)?(?:arguments|reasons|points)\b"
    )
    .unwrap();
}

const WATER_INTENSIVE_PHRASES: &[&str] = &[
    "water intensive",
    "water hungry",
    "water guzzling",
    "thirsty",
    "high water",
];

const CROP_LIST_WORDS: &[&str] = &["crop", "crops"];

const TOTAL_WORDS: &[&str] = &[
    "total",
    "sum",
    "overall",
    "combined",
    "cumulative",
    "altogether",
];

pub struct QueryParser {
    catalog: Arc<EntityCatalog>,
    ambiguity: AmbiguityResolver,
    rules: &'static [ClassificationRule],
    default_top_n: u32,
}

impl QueryParser {
    pub fn new(catalog: Arc<EntityCatalog>) -> Self {
        Self {
            ambiguity: AmbiguityResolver::new(catalog.clone()),
            catalog,
            rules: rules::RULES,
            default_top_n: 3,
        }
    }

    pub fn with_default_top_n(mut self, top_n: u32) -> Self {
        self.default_top_n = top_n.max(1);
        self
    }

    /// Parse a question. Never fails: anything unresolvable comes back as a
    /// `clarification` intent with `raw_text` intact.
    pub fn parse(&self, raw_text: &str) -> QueryIntent {
        let mut intent = QueryIntent::empty(raw_text);
        let normalized = normalize_text(raw_text);

        let years = extract_years(&normalized);
        intent.year_range = years.spec;
        let residual = blank_spans(&normalized, &years.consumed);

        let matches = self.catalog.scan(&residual);
        for m in &matches {
            match m.kind {
                EntityKind::State => push_unique(&mut intent.states, &m.canonical),
                EntityKind::District => push_unique(&mut intent.districts, &m.canonical),
                EntityKind::Crop => push_unique(&mut intent.crops, &m.canonical),
                EntityKind::CropGroup => {
                    for member in &m.members {
                        push_unique(&mut intent.crops, member);
                    }
                }
            }
        }

        // Keyword text: year phrases removed, whitespace collapsed.
        let keyword_text = residual.split_whitespace().collect::<Vec<_>>().join(" ");

        intent.focus = extract_focus(&keyword_text);
        intent.measures = extract_measures(&keyword_text, !intent.crops.is_empty());
        intent.crop_focus = extract_crop_focus(&keyword_text);
        intent.aggregation = extract_aggregation(&keyword_text);
        let explicit_top_n = extract_top_n(&keyword_text);

        let counts = EntityCounts {
            states: intent.states.len(),
            districts: intent.districts.len(),
            crops: intent.crops.len(),
        };

        let mut missing = Vec::new();

        let unknown = self
            .ambiguity
            .unrecognized_mentions(raw_text, &residual, &matches);
        for phrase in &unknown {
            missing.push(self.ambiguity.unrecognized_piece(phrase));
        }
        if let Some(reason) = &years.unresolved {
            missing.push(self.ambiguity.unresolved_years_piece(reason));
        }

        match rules::first_match(self.rules, &keyword_text, &counts) {
            Some(rule) => {
                intent.category = rule.category;
                if let Some(requirement) = rule.unmet_requirement(&counts) {
                    let covered = unknown
                        .iter()
                        .any(|phrase| self.ambiguity.covers(phrase, requirement));
                    if !covered {
                        missing.push(self.ambiguity.requirement_piece(requirement, &keyword_text));
                    }
                }
            }
            None => missing.push(self.ambiguity.unclassified_piece()),
        }

        intent.top_n = match intent.category {
            category if category.is_ranking() => Some(explicit_top_n.unwrap_or_else(|| {
                if is_singular_ranking(&keyword_text, category) {
                    1
                } else {
                    self.default_top_n
                }
            })),
            QueryCategory::PolicySupport => ARGUMENT_COUNT
                .captures(&keyword_text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| count_from_token(m.as_str()))
                .filter(|n| *n > 0)
                .or(explicit_top_n),
            QueryCategory::RainfallComparison => explicit_top_n.or_else(|| {
                contains_any(&keyword_text, CROP_LIST_WORDS).then_some(self.default_top_n)
            }),
            _ => explicit_top_n,
        };

        if !missing.is_empty() {
            intent.category = QueryCategory::Clarification;
            intent.clarification = Some(self.ambiguity.build_request(missing));
        }

        debug!(
            category = %intent.category,
            states = ?intent.states,
            districts = ?intent.districts,
            crops = ?intent.crops,
            year_range = ?intent.year_range,
            top_n = ?intent.top_n,
            aggregation = ?intent.aggregation,
            "Parsed question"
        );

        intent
    }
}

fn push_unique(target: &mut Vec<String>, value: &str) {
    if !target.iter().any(|v| v == value) {
        target.push(value.to_string());
    }
}

/// Replace byte spans with spaces, keeping every other offset stable.
fn blank_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for &(start, end) in spans {
        for byte in bytes.iter_mut().take(end.min(text.len())).skip(start) {
            *byte = b' ';
        }
    }
    // Spans come from regex matches over ASCII patterns, so they sit on
    // char boundaries; fall back to the original text otherwise.
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

fn extract_focus(text: &str) -> Vec<RankingFocus> {
    text.split_whitespace()
        .filter_map(|word| {
            if HIGHEST_WORDS.contains(&word) {
                Some(RankingFocus::Highest)
            } else if LOWEST_WORDS.contains(&word) {
                Some(RankingFocus::Lowest)
            } else {
                None
            }
        })
        .collect()
}

fn extract_measures(text: &str, has_crops: bool) -> Vec<Measure> {
    let mut measures = Vec::new();
    if contains_any(text, RAINFALL_WORDS) {
        measures.push(Measure::Rainfall);
    }
    if has_crops || contains_any(text, PRODUCTION_WORDS) {
        measures.push(Measure::Production);
    }
    measures
}

fn extract_crop_focus(text: &str) -> Option<CropFocus> {
    if contains_any(text, WATER_INTENSIVE_PHRASES) {
        Some(CropFocus::WaterIntensive)
    } else if contains_phrase(text, "drought resistant")
        || contains_phrase(text, "drought tolerant")
        || contains_phrase(text, "drought resilient")
    {
        Some(CropFocus::DroughtResistant)
    } else {
        None
    }
}

fn extract_aggregation(text: &str) -> Aggregation {
    if contains_any(text, TOTAL_WORDS) {
        Aggregation::Total
    } else {
        Aggregation::Average
    }
}

fn extract_top_n(text: &str) -> Option<u32> {
    TOP_N_AFTER
        .captures(text)
        .or_else(|| TOP_N_BEFORE.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| count_from_token(m.as_str()))
        .filter(|n| *n > 0)
}

/// "which state has the highest" asks for one answer; "top states" does not.
fn is_singular_ranking(text: &str, category: QueryCategory) -> bool {
    let (singular, plural) = match category {
        QueryCategory::DistrictRanking => ("district", "districts"),
        _ => ("state", "states"),
    };
    contains_phrase(text, singular) && !contains_phrase(text, plural)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::YearSpec;

    fn parser() -> QueryParser {
        QueryParser::new(Arc::new(EntityCatalog::builtin().unwrap()))
    }

    #[test]
    fn test_production_query_with_relative_years() {
        let intent =
            parser().parse("What is the average Wheat production in Karnataka over the last 3 years?");
        assert_eq!(intent.category, QueryCategory::ProductionQuery);
        assert_eq!(intent.states, vec!["Karnataka"]);
        assert_eq!(intent.crops, vec!["Wheat"]);
        assert_eq!(intent.year_range, Some(YearSpec::Latest { count: 3 }));
        assert_eq!(
            intent.raw_text,
            "What is the average Wheat production in Karnataka over the last 3 years?"
        );
    }

    #[test]
    fn test_rainfall_comparison() {
        let intent = parser().parse("Compare rainfall in Punjab and Haryana");
        assert_eq!(intent.category, QueryCategory::RainfallComparison);
        assert_eq!(intent.states, vec!["Punjab", "Haryana"]);
        assert_eq!(intent.top_n, None);

        let intent = parser().parse("Compare rainfall in Punjab and Haryana and list the top 4 crops");
        assert_eq!(intent.top_n, Some(4));
        let intent = parser().parse("Compare rainfall in Punjab and Haryana with their main crops");
        assert_eq!(intent.top_n, Some(3));
    }

    #[test]
    fn test_singular_state_ranking_defaults_to_one() {
        let intent = parser().parse("Which state has the highest Sugarcane production?");
        assert_eq!(intent.category, QueryCategory::StateRanking);
        assert_eq!(intent.crops, vec!["Sugarcane"]);
        assert_eq!(intent.top_n, Some(1));
        assert_eq!(intent.focus, vec![RankingFocus::Highest]);

        let intent = parser().parse("Top states for rice");
        assert_eq!(intent.top_n, Some(3));
        let intent = parser().parse("Top five states for rice");
        assert_eq!(intent.top_n, Some(5));
    }

    #[test]
    fn test_gibberish_is_clarification() {
        let intent = parser().parse("asdkjasd random text");
        assert_eq!(intent.category, QueryCategory::Clarification);
        let request = intent.clarification.unwrap();
        assert!(!request.missing_pieces.is_empty());
        assert_eq!(request.missing_pieces[0].field, "state_or_crop");
    }

    #[test]
    fn test_missing_crop_for_ranking() {
        let intent = parser().parse("Which state has the highest production?");
        assert_eq!(intent.category, QueryCategory::Clarification);
        let request = intent.clarification.unwrap();
        assert_eq!(request.missing_pieces[0].field, "crop");
    }

    #[test]
    fn test_vague_years_need_clarification() {
        let intent = parser().parse("Rice production in Punjab over the last few years");
        assert_eq!(intent.category, QueryCategory::Clarification);
        assert!(intent
            .clarification
            .unwrap()
            .missing_pieces
            .iter()
            .any(|p| p.field == "year_range"));
    }

    #[test]
    fn test_unknown_place_is_clarification_with_suggestion() {
        let intent = parser().parse("Average rainfall in Karnatka");
        assert_eq!(intent.category, QueryCategory::Clarification);
        let request = intent.clarification.unwrap();
        assert!(request
            .missing_pieces
            .iter()
            .any(|p| p.suggestions.contains(&"Karnataka".to_string())));
    }

    #[test]
    fn test_canonical_names_any_case() {
        for raw in ["UTTAR PRADESH", "uttar pradesh", "Uttar Pradesh"] {
            let intent = parser().parse(&format!("wheat production in {}", raw));
            assert_eq!(intent.states, vec!["Uttar Pradesh"]);
        }
    }

    #[test]
    fn test_year_phrase_does_not_trigger_ranking() {
        let intent = parser().parse("Rainfall in Kerala in the most recent year");
        assert_eq!(intent.category, QueryCategory::RainfallQuery);
        assert_eq!(intent.year_range, Some(YearSpec::Latest { count: 1 }));
        assert!(intent.focus.is_empty());
    }

    #[test]
    fn test_crop_group_and_policy_focus() {
        let intent = parser().parse("Give three arguments to promote millets over water-intensive crops in Maharashtra");
        assert_eq!(intent.category, QueryCategory::PolicySupport);
        assert_eq!(intent.crops, vec!["Bajra", "Jowar", "Ragi"]);
        assert_eq!(intent.crop_focus, Some(CropFocus::WaterIntensive));
        assert_eq!(intent.top_n, Some(3));
    }

    #[test]
    fn test_policy_top_n_caps_arguments() {
        let intent = parser().parse("Promote millets in Maharashtra, top 2 only");
        assert_eq!(intent.category, QueryCategory::PolicySupport);
        assert_eq!(intent.top_n, Some(2));
        // A counted noun wins over a stray "top".
        let intent = parser().parse("Give two reasons to promote millets in Maharashtra, top 5");
        assert_eq!(intent.top_n, Some(2));
        let intent = parser().parse("Promote millets in Maharashtra");
        assert_eq!(intent.top_n, None);
    }

    #[test]
    fn test_quantity_is_not_a_year() {
        let intent = parser().parse("Which state produced over 2000 tonnes of rice?");
        assert_eq!(intent.year_range, None);
        assert_eq!(intent.crops, vec!["Rice"]);
    }

    #[test]
    fn test_total_aggregation() {
        let intent = parser().parse("What is the total Wheat production in Karnataka?");
        assert_eq!(intent.category, QueryCategory::ProductionQuery);
        assert_eq!(intent.aggregation, Aggregation::Total);
        let intent = parser().parse("What is the average Wheat production in Karnataka?");
        assert_eq!(intent.aggregation, Aggregation::Average);
    }

    #[test]
    fn test_paired_focus() {
        let intent = parser().parse(
            "Which district has the highest wheat production in Punjab and the lowest in Haryana?",
        );
        assert_eq!(intent.category, QueryCategory::DistrictRanking);
        assert_eq!(intent.focus, vec![RankingFocus::Highest, RankingFocus::Lowest]);
        assert!(intent.has_paired_focus());
        assert_eq!(intent.top_n, Some(1));
    }

    #[test]
    fn test_explicit_range() {
        let intent = parser().parse("Trend of rice production in Punjab from 2010 to 2020");
        assert_eq!(intent.category, QueryCategory::TrendAnalysis);
        assert_eq!(intent.year_range, Some(YearSpec::Between { start: 2010, end: 2020 }));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = parser();
        let q = "Compare wheat and rice production in Punjab over the last decade";
        assert_eq!(parser.parse(q), parser.parse(q));
    }
}
