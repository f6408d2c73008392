//! Trend analysis: per-year series, least-squares slope, direction label and
//! percent change, for production and/or rainfall.

use super::{citation, join_names, push_not_available, scope_label, window, ProcessingContext};
use crate::dataset::{RowFilter, PRODUCTION_COL, RAINFALL_COL};
use crate::error::Result;
use crate::execution::result::{FindingKind, FindingValue, QueryResult, Unit};
use crate::intent::{Measure, QueryIntent};
use crate::stats::{linear_slope, mean, percent_change, yearly_mean, yearly_sum, TrendDirection};
use crate::time::YearRange;
use std::collections::BTreeMap;
use tracing::debug;

/// One yearly series and where its rows came from.
struct Series<'a> {
    /// e.g. "Rice production in Punjab"
    name: String,
    subject: String,
    yearly: BTreeMap<i32, f64>,
    unit: Unit,
    slope_unit: Unit,
    dataset: &'a str,
    filter: RowFilter,
    column: &'a str,
    rows: usize,
    rows_per_year: BTreeMap<i32, usize>,
}

fn rows_per_year(years: impl IntoIterator<Item = i32>) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for year in years {
        *counts.entry(year).or_insert(0) += 1;
    }
    counts
}

fn push_series(result: &mut QueryResult, series: Series, range: Option<YearRange>) {
    let scope = scope_label(range, series.yearly.keys().copied());

    if series.yearly.is_empty() {
        push_not_available(
            result,
            format!("{} trend {}", series.name, scope),
            FindingKind::TrendSlope,
            &series.subject,
            series.dataset,
            &series.filter,
            series.column,
        );
        return;
    }

    for (year, value) in &series.yearly {
        let year_filter = series.filter.clone().years(Some(YearRange::single(*year)));
        result.push_finding(
            format!("{} {}", series.name, year),
            FindingKind::YearlyValue { year: *year },
            series.subject.as_str(),
            FindingValue::number(*value, series.unit),
            citation(
                series.dataset,
                &year_filter,
                series.column,
                series.rows_per_year.get(year).copied().unwrap_or_default(),
            ),
        );
    }

    let cite = citation(series.dataset, &series.filter, series.column, series.rows);
    let points: Vec<(i32, f64)> = series.yearly.iter().map(|(y, v)| (*y, *v)).collect();
    let Some(slope) = linear_slope(&points) else {
        result.push_finding(
            format!("{} trend {}", series.name, scope),
            FindingKind::TrendSlope,
            series.subject.as_str(),
            FindingValue::not_available(format!(
                "fewer than 2 distinct years match {}",
                series.filter.describe()
            )),
            cite,
        );
        return;
    };

    let values: Vec<f64> = series.yearly.values().copied().collect();
    let average = mean(&values).unwrap_or_default();
    result.push_finding(
        format!("{} trend {}", series.name, scope),
        FindingKind::TrendSlope,
        series.subject.as_str(),
        FindingValue::number(slope, series.slope_unit),
        cite.clone(),
    );
    result.push_finding(
        format!("{} direction {}", series.name, scope),
        FindingKind::TrendDirection,
        series.subject.as_str(),
        FindingValue::text(TrendDirection::classify(slope, average).to_string()),
        cite.clone(),
    );

    let first = values.first().copied().unwrap_or_default();
    let last = values.last().copied().unwrap_or_default();
    let change = match percent_change(first, last) {
        Some(pct) => FindingValue::number(pct, Unit::Percent),
        None => FindingValue::not_available("first year's value is zero"),
    };
    result.push_finding(
        format!("{} change {}", series.name, scope),
        FindingKind::PercentChange,
        series.subject.as_str(),
        change,
        cite,
    );
}

/// Per-year production (sum over districts) and/or rainfall (state mean)
/// for each requested place and crop.
pub fn process_trend_analysis(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let wants_production = !intent.crops.is_empty() || intent.asks_about(Measure::Production);
    let wants_rainfall = intent.asks_about(Measure::Rainfall);
    // Neither named explicitly: a place alone means its production.
    let wants_production = wants_production || !wants_rainfall;

    let crops_table = if wants_production {
        Some(ctx.datasets.crop_table()?)
    } else {
        None
    };
    let rain_table = if wants_rainfall {
        Some(ctx.datasets.rainfall_table()?)
    } else {
        None
    };

    let max_year = match (&crops_table, &rain_table) {
        (Some(t), _) => t.max_year()?,
        (None, Some(t)) => t.max_year()?,
        (None, None) => None,
    };
    let range = window(intent.year_range, ctx.defaults.trend_years, max_year);
    let mut result = QueryResult::new();

    let places: Vec<Option<&String>> = if intent.states.is_empty() {
        vec![None]
    } else {
        intent.states.iter().map(Some).collect()
    };

    if let Some(table) = &crops_table {
        let crops: Vec<Option<&String>> = if intent.crops.is_empty() {
            vec![None]
        } else {
            intent.crops.iter().map(Some).collect()
        };
        for place in &places {
            for crop in &crops {
                let mut filter = RowFilter::new().districts(&intent.districts).years(range);
                if let Some(s) = place {
                    filter = filter.state(s);
                }
                if let Some(c) = crop {
                    filter = filter.crop(c);
                }
                let records = table.select(&filter)?;
                let where_ = match place {
                    Some(s) => s.to_string(),
                    None if !intent.districts.is_empty() => join_names(&intent.districts),
                    None => "India".to_string(),
                };
                let what = crop
                    .map(|c| format!("{} production", c))
                    .unwrap_or_else(|| "Total crop production".to_string());
                push_series(
                    &mut result,
                    Series {
                        name: format!("{} in {}", what, where_),
                        subject: where_.clone(),
                        yearly: yearly_sum(records.iter().map(|r| (r.year, r.production_tonnes))),
                        unit: Unit::Tonnes,
                        slope_unit: Unit::TonnesPerYear,
                        dataset: table.name(),
                        filter,
                        column: PRODUCTION_COL,
                        rows: records.len(),
                        rows_per_year: rows_per_year(records.iter().map(|r| r.year)),
                    },
                    range,
                );
            }
        }
    }

    if let Some(table) = &rain_table {
        for place in &places {
            let mut filter = RowFilter::new().years(range);
            if let Some(s) = place {
                filter = filter.state(s);
            }
            let records = table.select(&filter)?;
            let where_ = place.map(|s| s.as_str()).unwrap_or("India");
            push_series(
                &mut result,
                Series {
                    name: format!("Annual rainfall in {}", where_),
                    subject: where_.to_string(),
                    yearly: yearly_mean(records.iter().map(|r| (r.year, r.annual_rainfall_mm))),
                    unit: Unit::Millimetres,
                    slope_unit: Unit::MillimetresPerYear,
                    dataset: table.name(),
                    filter,
                    column: RAINFALL_COL,
                    rows: records.len(),
                    rows_per_year: rows_per_year(records.iter().map(|r| r.year)),
                },
                range,
            );
        }
    }

    debug!(findings = result.findings.len(), "trend_analysis processed");
    Ok(result)
}
