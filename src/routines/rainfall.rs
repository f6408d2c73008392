//! Rainfall questions: per-state averages and state-vs-state comparisons.

use super::production::leader_hint;
use super::{
    citation, coverage_note, production_by, push_not_available, rainfall_coverage, scope_label,
    window, ProcessingContext,
};
use crate::dataset::{RainfallRecord, RainfallTable, RowFilter, MONSOON_MONTHS, PRODUCTION_COL, RAINFALL_COL};
use crate::error::Result;
use crate::execution::result::{FindingKind, FindingValue, QueryResult, Unit};
use crate::intent::QueryIntent;
use crate::stats::{linear_slope, mean};
use crate::time::YearRange;
use tracing::debug;

/// Push the average annual rainfall finding for one state. Returns the
/// average when rows matched.
fn push_average(
    result: &mut QueryResult,
    table: &RainfallTable,
    state: &str,
    range: Option<YearRange>,
    records: &[RainfallRecord],
    filter: &RowFilter,
) -> Option<f64> {
    let label = format!(
        "{} avg annual rainfall {}",
        state,
        scope_label(range, records.iter().map(|r| r.year))
    );
    let values: Vec<f64> = records.iter().map(|r| r.annual_rainfall_mm).collect();
    match mean(&values) {
        Some(avg) => {
            result.push_finding(
                label,
                FindingKind::AverageRainfall,
                state,
                FindingValue::number(avg, Unit::Millimetres),
                citation(table.name(), filter, RAINFALL_COL, records.len()),
            );
            Some(avg)
        }
        None => {
            push_not_available(
                result,
                label,
                FindingKind::AverageRainfall,
                state,
                table.name(),
                filter,
                RAINFALL_COL,
            );
            None
        }
    }
}

/// Coverage guidance for every requested state without rows in the window.
fn push_coverage_notes(
    ctx: &ProcessingContext,
    table: &RainfallTable,
    result: &mut QueryResult,
    missing: &[String],
    asked: &[String],
) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    let coverage = rainfall_coverage(ctx, table)?;
    for state in missing {
        result.hint(coverage_note("Rainfall", &coverage, Some(state), asked));
    }
    Ok(())
}

/// Average (and, over multi-year windows, the trend) of annual rainfall per
/// requested state, plus the June-September average when month columns exist.
pub fn process_rainfall_query(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let table = ctx.datasets.rainfall_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.rainfall_query_years,
        table.max_year()?,
    );
    let mut result = QueryResult::new();
    let mut averages: Vec<(String, f64)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for state in &intent.states {
        let filter = RowFilter::new().state(state).years(range);
        let records = table.select(&filter)?;
        let scope = scope_label(range, records.iter().map(|r| r.year));

        match push_average(&mut result, &table, state, range, &records, &filter) {
            Some(avg) => averages.push((state.clone(), avg)),
            None => missing.push(state.clone()),
        }

        if table.has_monsoon_columns() && !records.is_empty() {
            let monsoon: Vec<f64> = records.iter().filter_map(|r| r.monsoon_mm).collect();
            let label = format!("{} avg monsoon (Jun-Sep) rainfall {}", state, scope);
            let column = MONSOON_MONTHS.join("+");
            match mean(&monsoon) {
                Some(avg) => {
                    result.push_finding(
                        label,
                        FindingKind::MonsoonRainfall,
                        state.as_str(),
                        FindingValue::number(avg, Unit::Millimetres),
                        citation(table.name(), &filter, &column, monsoon.len()),
                    );
                }
                None => {
                    push_not_available(
                        &mut result,
                        label,
                        FindingKind::MonsoonRainfall,
                        state,
                        table.name(),
                        &filter,
                        &column,
                    );
                }
            }
        }

        let multi_year = range.map(|r| r.len() >= 2).unwrap_or(true);
        if multi_year && !records.is_empty() {
            let points: Vec<(i32, f64)> = records.iter().map(|r| (r.year, r.annual_rainfall_mm)).collect();
            let label = format!("{} rainfall trend {}", state, scope);
            let value = match linear_slope(&points) {
                Some(slope) => FindingValue::number(slope, Unit::MillimetresPerYear),
                None => FindingValue::not_available(format!(
                    "fewer than 2 distinct years match {}",
                    filter.describe()
                )),
            };
            result.push_finding(
                label,
                FindingKind::TrendSlope,
                state.as_str(),
                value,
                citation(table.name(), &filter, RAINFALL_COL, records.len()),
            );
        }
    }

    if averages.len() >= 2 {
        if let Some(hint) = leader_hint("avg annual rainfall", &averages) {
            result.hint(hint);
        }
    }
    push_coverage_notes(ctx, &table, &mut result, &missing, &intent.states)?;

    debug!(findings = result.findings.len(), "rainfall_query processed");
    Ok(result)
}

/// One average-rainfall finding per state, the wetter state as a hint, and
/// the top crops per state over the same window when the question asks.
pub fn process_rainfall_comparison(
    ctx: &ProcessingContext,
    intent: &QueryIntent,
) -> Result<QueryResult> {
    let table = ctx.datasets.rainfall_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.rainfall_comparison_years,
        table.max_year()?,
    );
    let mut result = QueryResult::new();
    let mut averages: Vec<(String, f64)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for state in &intent.states {
        let filter = RowFilter::new().state(state).years(range);
        let records = table.select(&filter)?;
        match push_average(&mut result, &table, state, range, &records, &filter) {
            Some(avg) => averages.push((state.clone(), avg)),
            None => missing.push(state.clone()),
        }
    }

    if averages.len() >= 2 {
        if let Some(hint) = leader_hint("avg annual rainfall", &averages) {
            result.hint(hint);
        }
    }
    push_coverage_notes(ctx, &table, &mut result, &missing, &intent.states)?;

    if let Some(top_n) = intent.top_n {
        // Same window as the rainfall figures, so the two are comparable.
        let crops = ctx.datasets.crop_table()?;
        for state in &intent.states {
            let filter = RowFilter::new().state(state).years(range);
            let records = crops.select(&filter)?;
            let scope = scope_label(range, records.iter().map(|r| r.year));
            if records.is_empty() {
                push_not_available(
                    &mut result,
                    format!("{} top crops {}", state, scope),
                    FindingKind::TopCrop { rank: 1 },
                    state,
                    crops.name(),
                    &filter,
                    PRODUCTION_COL,
                );
                continue;
            }

            let totals = production_by(&records, |r| ctx.crop_name(&r.crop));
            let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
            ranked.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
            });

            for (idx, (crop, total)) in ranked.into_iter().take(top_n as usize).enumerate() {
                let crop_filter = filter.clone().crop(&crop);
                let rows = records
                    .iter()
                    .filter(|r| ctx.crop_name(&r.crop) == crop)
                    .count();
                result.push_finding(
                    format!("{} top crop #{} {}", state, idx + 1, scope),
                    FindingKind::TopCrop { rank: idx + 1 },
                    crop.clone(),
                    FindingValue::number(total, Unit::Tonnes),
                    citation(crops.name(), &crop_filter, PRODUCTION_COL, rows),
                );
            }
        }
    }

    debug!(findings = result.findings.len(), "rainfall_comparison processed");
    Ok(result)
}
