//! Structured form of a parsed question.
//!
//! A [`QueryIntent`] is produced once per question by the parser and then
//! only read: the router, routines and formatter all take it by reference.

use crate::time::YearSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Question category. Each one maps to a single processing routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    RainfallComparison,
    RainfallQuery,
    DistrictRanking,
    StateRanking,
    TrendAnalysis,
    PolicySupport,
    ProductionQuery,
    ProductionComparison,
    CorrelationQuery,
    Clarification,
    /// Anything outside the enumerated set (e.g. a stale serialized intent).
    #[serde(other)]
    Unrecognized,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 10] = [
        QueryCategory::RainfallComparison,
        QueryCategory::RainfallQuery,
        QueryCategory::DistrictRanking,
        QueryCategory::StateRanking,
        QueryCategory::TrendAnalysis,
        QueryCategory::PolicySupport,
        QueryCategory::ProductionQuery,
        QueryCategory::ProductionComparison,
        QueryCategory::CorrelationQuery,
        QueryCategory::Clarification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::RainfallComparison => "rainfall_comparison",
            QueryCategory::RainfallQuery => "rainfall_query",
            QueryCategory::DistrictRanking => "district_ranking",
            QueryCategory::StateRanking => "state_ranking",
            QueryCategory::TrendAnalysis => "trend_analysis",
            QueryCategory::PolicySupport => "policy_support",
            QueryCategory::ProductionQuery => "production_query",
            QueryCategory::ProductionComparison => "production_comparison",
            QueryCategory::CorrelationQuery => "correlation_query",
            QueryCategory::Clarification => "clarification",
            QueryCategory::Unrecognized => "unrecognized",
        }
    }

    pub fn is_ranking(&self) -> bool {
        matches!(
            self,
            QueryCategory::DistrictRanking | QueryCategory::StateRanking
        )
    }
}

impl fmt::Display for QueryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingFocus {
    Highest,
    Lowest,
}

/// What the question measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Rainfall,
    Production,
}

/// How production figures are summarized over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Mean of the yearly totals.
    #[default]
    Average,
    /// Sum over the window, with the yearly totals behind it.
    Total,
}

/// Which crops a policy question argues for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropFocus {
    DroughtResistant,
    WaterIntensive,
}

/// A specific piece of missing information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingPiece {
    /// Field name: "state", "crop", "year_range", "entity"
    pub field: String,
    /// Human-readable description of what's missing
    pub description: String,
    /// Close catalog names, if any
    pub suggestions: Vec<String>,
}

/// Why a question was turned into a clarification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Single consolidated question covering all missing information
    pub question: String,
    pub missing_pieces: Vec<MissingPiece>,
    /// Example questions the parser does understand
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub category: QueryCategory,
    /// Canonical state names in order of mention.
    pub states: Vec<String>,
    pub districts: Vec<String>,
    /// Canonical crop names; crop groups are already expanded.
    pub crops: Vec<String>,
    /// Literal span or deferred "last N years"; `None` lets each routine
    /// apply its default window.
    pub year_range: Option<YearSpec>,
    pub top_n: Option<u32>,
    /// Highest/lowest requests in order of mention.
    #[serde(default)]
    pub focus: Vec<RankingFocus>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub crop_focus: Option<CropFocus>,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub raw_text: String,
    #[serde(default)]
    pub clarification: Option<ClarificationRequest>,
}

impl QueryIntent {
    /// An intent with no entities, used as the base for parsing.
    pub fn empty(raw_text: impl Into<String>) -> Self {
        Self {
            category: QueryCategory::Clarification,
            states: Vec::new(),
            districts: Vec::new(),
            crops: Vec::new(),
            year_range: None,
            top_n: None,
            focus: Vec::new(),
            measures: Vec::new(),
            crop_focus: None,
            aggregation: Aggregation::Average,
            raw_text: raw_text.into(),
            clarification: None,
        }
    }

    pub fn is_clarification(&self) -> bool {
        self.category == QueryCategory::Clarification
    }

    pub fn asks_about(&self, measure: Measure) -> bool {
        self.measures.contains(&measure)
    }

    /// Focus for the n-th ranked group. With a single focus it applies to
    /// every group; with none the default is highest.
    pub fn focus_for(&self, index: usize) -> RankingFocus {
        match self.focus.len() {
            0 => RankingFocus::Highest,
            1 => self.focus[0],
            _ if self.focus.len() == self.states.len() => self.focus[index.min(self.focus.len() - 1)],
            _ => self.focus[0],
        }
    }

    /// Every focus mentioned, deduplicated in order of mention.
    pub fn distinct_focus(&self) -> Vec<RankingFocus> {
        let mut out: Vec<RankingFocus> = Vec::new();
        for focus in &self.focus {
            if !out.contains(focus) {
                out.push(*focus);
            }
        }
        if out.is_empty() {
            out.push(RankingFocus::Highest);
        }
        out
    }

    /// True when the n-th focus pairs with the n-th state.
    pub fn has_paired_focus(&self) -> bool {
        self.focus.len() >= 2 && self.focus.len() == self.states.len()
    }
}
