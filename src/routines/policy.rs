//! Policy support: data-backed arguments for promoting a class of crops in a
//! state. Each argument is one finding with its own citation.

use super::{citation, join_names, scope_label, window, ProcessingContext};
use crate::catalog::WaterNeed;
use crate::dataset::{RowFilter, PRODUCTION_COL, RAINFALL_COL};
use crate::error::Result;
use crate::execution::result::{Citation, FindingKind, FindingValue, NarrativeHint, QueryResult, Unit};
use crate::intent::{CropFocus, QueryIntent};
use crate::stats::{linear_slope, mean, percent_change, yearly_mean, yearly_sum, TrendDirection};
use tracing::debug;

/// Arguments this routine knows how to build.
pub const AVAILABLE_ARGUMENTS: usize = 3;

struct Argument {
    label: String,
    value: FindingValue,
    claim: String,
    citation: Citation,
}

fn direction_phrase(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Increasing => "has been rising",
        TrendDirection::Decreasing => "has been falling",
        TrendDirection::Stable => "has held steady",
    }
}

pub fn process_policy_support(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let crops = ctx.datasets.crop_table()?;
    let rain = ctx.datasets.rainfall_table()?;
    let range = window(intent.year_range, ctx.defaults.policy_years, crops.max_year()?);
    let mut result = QueryResult::new();

    // Named crops are the ones promoted; their water need decides which
    // side of the water-intensity comparison they sit on.
    let (promoted, promoted_need): (Vec<String>, WaterNeed) = if intent.crops.is_empty() {
        let need = match intent.crop_focus.unwrap_or(CropFocus::DroughtResistant) {
            CropFocus::DroughtResistant => WaterNeed::Low,
            CropFocus::WaterIntensive => WaterNeed::High,
        };
        (ctx.catalog.crops_with_water_need(need), need)
    } else {
        let thirsty = intent
            .crops
            .iter()
            .filter(|c| ctx.catalog.water_need(c) == Some(WaterNeed::High))
            .count();
        let need = if thirsty * 2 > intent.crops.len() {
            WaterNeed::High
        } else {
            WaterNeed::Low
        };
        (intent.crops.clone(), need)
    };
    let (alternate_need, focus, focus_label) = match promoted_need {
        WaterNeed::High => (WaterNeed::Low, CropFocus::WaterIntensive, "water-intensive crops"),
        _ => (WaterNeed::High, CropFocus::DroughtResistant, "drought-resistant crops"),
    };
    let alternate: Vec<String> = ctx
        .catalog
        .crops_with_water_need(alternate_need)
        .into_iter()
        .filter(|c| !promoted.contains(c))
        .collect();
    let promoted_label = if intent.crops.is_empty() {
        focus_label.to_string()
    } else {
        join_names(&promoted)
    };

    let requested = intent
        .top_n
        .map(|n| n as usize)
        .unwrap_or(ctx.defaults.policy_arguments as usize)
        .max(1);
    let count = requested.min(AVAILABLE_ARGUMENTS);
    if requested > AVAILABLE_ARGUMENTS {
        result.hint(NarrativeHint::Note {
            text: format!(
                "{} arguments were requested; the data supports {}.",
                requested, AVAILABLE_ARGUMENTS
            ),
        });
    }

    for state in &intent.states {
        // 1. Rainfall trend.
        let rain_filter = RowFilter::new().state(state).years(range);
        let rain_rows = rain.select(&rain_filter)?;
        let yearly_rain = yearly_mean(rain_rows.iter().map(|r| (r.year, r.annual_rainfall_mm)));
        let rain_points: Vec<(i32, f64)> = yearly_rain.iter().map(|(y, v)| (*y, *v)).collect();
        let rain_scope = scope_label(range, yearly_rain.keys().copied());
        let (value, claim) = match linear_slope(&rain_points) {
            Some(slope) => {
                let values: Vec<f64> = yearly_rain.values().copied().collect();
                let direction = TrendDirection::classify(slope, mean(&values).unwrap_or_default());
                (
                    FindingValue::number(slope, Unit::MillimetresPerYear),
                    format!(
                        "Annual rainfall in {} {} {}, which {}",
                        state,
                        direction_phrase(direction),
                        rain_scope,
                        rainfall_reading(focus, direction)
                    ),
                )
            }
            None => (
                FindingValue::not_available(format!(
                    "fewer than 2 distinct years match {}",
                    rain_filter.describe()
                )),
                format!("The rainfall trend in {} {} could not be established", state, rain_scope),
            ),
        };
        let mut arguments = vec![Argument {
            label: format!("{} rainfall trend {}", state, rain_scope),
            value,
            claim,
            citation: citation(rain.name(), &rain_filter, RAINFALL_COL, rain_rows.len()),
        }];

        // 2. Production trend of the promoted crops.
        let promoted_filter = RowFilter::new().state(state).crops(&promoted).years(range);
        let promoted_rows = crops.select(&promoted_filter)?;
        let yearly_promoted = yearly_sum(promoted_rows.iter().map(|r| (r.year, r.production_tonnes)));
        let prod_scope = scope_label(range, yearly_promoted.keys().copied());
        let values: Vec<f64> = yearly_promoted.values().copied().collect();
        let points: Vec<(i32, f64)> = yearly_promoted.iter().map(|(y, v)| (*y, *v)).collect();
        let (value, claim) = match (linear_slope(&points), values.first(), values.last()) {
            (Some(slope), Some(first), Some(last)) => {
                let direction = TrendDirection::classify(slope, mean(&values).unwrap_or_default());
                let value = match percent_change(*first, *last) {
                    Some(pct) => FindingValue::number(pct, Unit::Percent),
                    None => FindingValue::not_available("first year's production is zero"),
                };
                (
                    value,
                    format!(
                        "Production of {} in {} {} {}, showing the crops are viable there",
                        promoted_label,
                        state,
                        direction_phrase(direction),
                        prod_scope
                    ),
                )
            }
            _ => (
                FindingValue::not_available(format!(
                    "fewer than 2 distinct years match {}",
                    promoted_filter.describe()
                )),
                format!(
                    "There is not enough production history for {} in {} {}",
                    promoted_label, state, prod_scope
                ),
            ),
        };
        arguments.push(Argument {
            label: format!("{} {} production change {}", state, promoted_label, prod_scope),
            value,
            claim,
            citation: citation(crops.name(), &promoted_filter, PRODUCTION_COL, promoted_rows.len()),
        });

        // 3. Share of promoted crops in promoted + alternate output.
        let mut both: Vec<String> = promoted.clone();
        both.extend(alternate.iter().cloned());
        let share_filter = RowFilter::new().state(state).crops(&both).years(range);
        let share_rows = crops.select(&share_filter)?;
        let promoted_total: f64 = share_rows
            .iter()
            .filter(|r| promoted.contains(&ctx.crop_name(&r.crop)))
            .map(|r| r.production_tonnes)
            .sum();
        let combined: f64 = share_rows.iter().map(|r| r.production_tonnes).sum();
        let share_scope = scope_label(range, share_rows.iter().map(|r| r.year));
        let value = if combined > 0.0 {
            FindingValue::number(promoted_total / combined * 100.0, Unit::Percent)
        } else {
            FindingValue::not_available(format!("no production rows match {}", share_filter.describe()))
        };
        arguments.push(Argument {
            label: format!("{} {} share of output {}", state, promoted_label, share_scope),
            value,
            claim: format!(
                "{} make up this share of combined output with {} in {} {}",
                promoted_label,
                join_names(&alternate),
                state,
                share_scope
            ),
            citation: citation(crops.name(), &share_filter, PRODUCTION_COL, share_rows.len()),
        });

        for (index, argument) in arguments.into_iter().take(count).enumerate() {
            let finding = result.push_finding(
                argument.label,
                FindingKind::PolicyArgument { index: index + 1 },
                state.as_str(),
                argument.value,
                argument.citation,
            );
            result.hint(NarrativeHint::Argument {
                finding,
                claim: argument.claim,
            });
        }
    }

    debug!(findings = result.findings.len(), "policy_support processed");
    Ok(result)
}

fn rainfall_reading(focus: CropFocus, direction: TrendDirection) -> &'static str {
    match (focus, direction) {
        (CropFocus::DroughtResistant, TrendDirection::Decreasing) => {
            "strengthens the case for crops that tolerate low rainfall"
        }
        (CropFocus::DroughtResistant, _) => "leaves rain-fed crops exposed in dry years",
        (CropFocus::WaterIntensive, TrendDirection::Decreasing) => {
            "means water-intensive crops will lean more on irrigation"
        }
        (CropFocus::WaterIntensive, _) => "supports crops that need assured water",
    }
}
