//! Query Router - maps an intent's category to its processing routine
//!
//! Routing is a pure lookup. The only irregular case is a category outside
//! the enumerated set, which falls back to the generic production routine.

use crate::error::Result;
use crate::execution::result::QueryResult;
use crate::intent::{QueryCategory, QueryIntent};
use crate::routines::{
    clarification, correlation, policy, production, rainfall, ranking, trend, ProcessingContext,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// The routine chosen for one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routine {
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
}

impl Routine {
    pub fn name(&self) -> &'static str {
        match self {
            Routine::RainfallComparison => "rainfall_comparison",
            Routine::RainfallQuery => "rainfall_query",
            Routine::DistrictRanking => "district_ranking",
            Routine::StateRanking => "state_ranking",
            Routine::TrendAnalysis => "trend_analysis",
            Routine::PolicySupport => "policy_support",
            Routine::ProductionQuery => "production_query",
            Routine::ProductionComparison => "production_comparison",
            Routine::CorrelationQuery => "correlation_query",
            Routine::Clarification => "clarification",
        }
    }

    /// Run the routine. Only the clarification responder reads no data.
    pub fn run(&self, ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
        match self {
            Routine::RainfallComparison => rainfall::process_rainfall_comparison(ctx, intent),
            Routine::RainfallQuery => rainfall::process_rainfall_query(ctx, intent),
            Routine::DistrictRanking => ranking::process_district_ranking(ctx, intent),
            Routine::StateRanking => ranking::process_state_ranking(ctx, intent),
            Routine::TrendAnalysis => trend::process_trend_analysis(ctx, intent),
            Routine::PolicySupport => policy::process_policy_support(ctx, intent),
            Routine::ProductionQuery => production::process_production_query(ctx, intent),
            Routine::ProductionComparison => {
                production::process_production_comparison(ctx, intent)
            }
            Routine::CorrelationQuery => correlation::process_correlation_query(ctx, intent),
            Routine::Clarification => Ok(clarification::process_clarification(intent)),
        }
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pick the routine for an intent's category.
pub fn route(intent: &QueryIntent) -> Routine {
    let routine = match intent.category {
        QueryCategory::RainfallComparison => Routine::RainfallComparison,
        QueryCategory::RainfallQuery => Routine::RainfallQuery,
        QueryCategory::DistrictRanking => Routine::DistrictRanking,
        QueryCategory::StateRanking => Routine::StateRanking,
        QueryCategory::TrendAnalysis => Routine::TrendAnalysis,
        QueryCategory::PolicySupport => Routine::PolicySupport,
        QueryCategory::ProductionQuery => Routine::ProductionQuery,
        QueryCategory::ProductionComparison => Routine::ProductionComparison,
        QueryCategory::CorrelationQuery => Routine::CorrelationQuery,
        QueryCategory::Clarification => Routine::Clarification,
        QueryCategory::Unrecognized => {
            warn!(
                raw_text = %intent.raw_text,
                "Unrecognized query category, falling back to production_query"
            );
            Routine::ProductionQuery
        }
    };
    debug!(category = %intent.category, routine = %routine, "Routed query");
    routine
}

/// Route and run in one step.
pub fn process(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    route(intent).run(ctx, intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_routes_to_its_namesake() {
        for category in QueryCategory::ALL {
            let mut intent = QueryIntent::empty("q");
            intent.category = category;
            assert_eq!(route(&intent).name(), category.as_str());
        }
    }

    #[test]
    fn test_unrecognized_category_falls_back_to_production() {
        let intent: QueryIntent = serde_json::from_str(
            r#"{"category":"weather_forecast","states":["Punjab"],"districts":[],
                "crops":["Wheat"],"year_range":null,"top_n":null,"raw_text":"q"}"#,
        )
        .unwrap();
        assert_eq!(intent.category, QueryCategory::Unrecognized);
        assert_eq!(route(&intent), Routine::ProductionQuery);
    }
}
