//! Production questions: single aggregates and side-by-side comparisons.

use super::{
    citation, coverage_note, crop_coverage, join_names, push_not_available, scope_label, window,
    ProcessingContext,
};
use crate::dataset::{CropRecord, CropTable, RowFilter, PRODUCTION_COL};
use crate::error::Result;
use crate::execution::result::{FindingKind, FindingValue, NarrativeHint, QueryResult, Unit};
use crate::intent::{Aggregation, QueryIntent};
use crate::stats::{mean, yearly_sum};
use crate::time::YearRange;
use std::collections::BTreeMap;
use tracing::debug;

/// Where a figure is taken: a district, a state or the whole country.
#[derive(Debug, Clone, PartialEq)]
enum Location {
    District(String),
    State(String),
    National,
}

impl Location {
    fn label(&self) -> String {
        match self {
            Location::District(d) => format!("{} district", d),
            Location::State(s) => s.clone(),
            Location::National => "India".to_string(),
        }
    }

    fn subject(&self) -> String {
        match self {
            Location::District(d) | Location::State(d) => d.clone(),
            Location::National => "India".to_string(),
        }
    }

    fn apply(&self, filter: RowFilter) -> RowFilter {
        match self {
            Location::District(d) => filter.district(d),
            Location::State(s) => filter.state(s),
            Location::National => filter,
        }
    }
}

fn locations(intent: &QueryIntent) -> Vec<Location> {
    if !intent.districts.is_empty() {
        intent.districts.iter().cloned().map(Location::District).collect()
    } else if !intent.states.is_empty() {
        intent.states.iter().cloned().map(Location::State).collect()
    } else {
        vec![Location::National]
    }
}

fn crop_phrase(crop: Option<&String>) -> String {
    match crop {
        Some(c) => format!("{} production", c),
        None => "production (all crops)".to_string(),
    }
}

/// Average annual production: the mean of the yearly totals. The same
/// figure backs every "avg" production finding.
fn average_annual(records: &[CropRecord]) -> Option<f64> {
    let yearly = yearly_totals(records);
    mean(&yearly.values().copied().collect::<Vec<_>>())
}

fn yearly_totals(records: &[CropRecord]) -> BTreeMap<i32, f64> {
    yearly_sum(records.iter().map(|r| (r.year, r.production_tonnes)))
}

fn average_label(crop: Option<&String>, location: &Location, scope: &str) -> String {
    format!("avg {} in {} {}", crop_phrase(crop), location.label(), scope)
}

/// One coverage note per empty (location, crop) pair.
fn push_coverage_notes(
    ctx: &ProcessingContext,
    table: &CropTable,
    result: &mut QueryResult,
    gaps: &[(Location, Option<&String>)],
    asked: &[String],
) -> Result<()> {
    let mut seen: Vec<(Option<String>, Option<String>)> = Vec::new();
    for (location, crop) in gaps {
        let state = match location {
            Location::State(s) => Some(s.clone()),
            _ => None,
        };
        let key = (state.clone(), crop.cloned());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        let coverage = crop_coverage(ctx, table, crop.map(String::as_str))?;
        let what = match crop {
            Some(c) => format!("{} production", c),
            None => "Crop production".to_string(),
        };
        result.hint(coverage_note(&what, &coverage, state.as_deref(), asked));
    }
    Ok(())
}

/// Production per requested location and crop over the window.
///
/// Averages by default: one finding per location x crop holding the mean of
/// the yearly totals. A "total" question gets the sum instead, followed by
/// the yearly totals behind it when the window spans several years.
pub fn process_production_query(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let table = ctx.datasets.crop_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.production_years,
        table.max_year()?,
    );
    let mut result = QueryResult::new();
    let mut gaps: Vec<(Location, Option<&String>)> = Vec::new();

    let crops: Vec<Option<&String>> = if intent.crops.is_empty() {
        vec![None]
    } else {
        intent.crops.iter().map(Some).collect()
    };

    for location in locations(intent) {
        for crop in &crops {
            let mut filter = location.apply(RowFilter::new().years(range));
            if let Some(c) = crop {
                filter = filter.crop(c);
            }
            let records = table.select(&filter)?;
            let scope = scope_label(range, records.iter().map(|r| r.year));
            let subject = match crop {
                Some(c) => format!("{} / {}", location.subject(), c),
                None => location.subject(),
            };
            let yearly = yearly_totals(&records);

            let (label, kind, value) = match intent.aggregation {
                Aggregation::Average => (
                    average_label(*crop, &location, &scope),
                    FindingKind::AverageProduction,
                    average_annual(&records),
                ),
                Aggregation::Total => (
                    format!("total {} in {} {}", crop_phrase(*crop), location.label(), scope),
                    FindingKind::TotalProduction,
                    (!yearly.is_empty()).then(|| yearly.values().sum::<f64>()),
                ),
            };

            let Some(value) = value else {
                push_not_available(
                    &mut result,
                    label,
                    kind,
                    &subject,
                    table.name(),
                    &filter,
                    PRODUCTION_COL,
                );
                gaps.push((location.clone(), *crop));
                continue;
            };
            result.push_finding(
                label,
                kind,
                subject.clone(),
                FindingValue::number(value, Unit::Tonnes),
                citation(table.name(), &filter, PRODUCTION_COL, records.len()),
            );

            if intent.aggregation == Aggregation::Total && yearly.len() >= 2 {
                for (&year, &total) in &yearly {
                    let year_filter = filter.clone().years(Some(YearRange::single(year)));
                    let rows = records.iter().filter(|r| r.year == year).count();
                    result.push_finding(
                        format!("{} in {} ({})", crop_phrase(*crop), location.label(), year),
                        FindingKind::YearlyValue { year },
                        subject.clone(),
                        FindingValue::number(total, Unit::Tonnes),
                        citation(table.name(), &year_filter, PRODUCTION_COL, rows),
                    );
                }
            }
        }
    }

    push_coverage_notes(ctx, &table, &mut result, &gaps, &intent.states)?;

    debug!(
        findings = result.findings.len(),
        aggregation = ?intent.aggregation,
        "production_query processed"
    );
    Ok(result)
}

/// Average annual production side by side, with a leader hint per group.
pub fn process_production_comparison(
    ctx: &ProcessingContext,
    intent: &QueryIntent,
) -> Result<QueryResult> {
    let table = ctx.datasets.crop_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.comparison_years,
        table.max_year()?,
    );
    let mut result = QueryResult::new();

    let places = locations(intent);
    let mut gaps: Vec<(Location, Option<&String>)> = Vec::new();
    // Groups of sides compared against each other.
    let groups: Vec<(String, Vec<(Location, Option<&String>)>)> = if places.len() >= 2 {
        let crops: Vec<Option<&String>> = if intent.crops.is_empty() {
            vec![None]
        } else {
            intent.crops.iter().map(Some).collect()
        };
        crops
            .into_iter()
            .map(|crop| {
                let sides = places.iter().cloned().map(|p| (p, crop)).collect();
                (format!("avg annual {}", crop_phrase(crop)), sides)
            })
            .collect()
    } else {
        places
            .iter()
            .map(|place| {
                let sides = intent.crops.iter().map(|c| (place.clone(), Some(c))).collect();
                (format!("avg annual production in {}", place.label()), sides)
            })
            .collect()
    };

    for (metric, sides) in groups {
        let mut available: Vec<(String, f64)> = Vec::new();
        for (location, crop) in sides {
            let mut filter = location.apply(RowFilter::new().years(range));
            if let Some(c) = crop {
                filter = filter.crop(c);
            }
            let records = table.select(&filter)?;
            let label = average_label(
                crop,
                &location,
                &scope_label(range, records.iter().map(|r| r.year)),
            );
            // The side's name within its group: the place when places are
            // compared, the crop otherwise.
            let side_name = if places.len() >= 2 {
                location.subject()
            } else {
                crop.cloned().unwrap_or_else(|| location.subject())
            };

            match average_annual(&records) {
                Some(avg) => {
                    result.push_finding(
                        label,
                        FindingKind::AverageProduction,
                        side_name.clone(),
                        FindingValue::number(avg, Unit::Tonnes),
                        citation(table.name(), &filter, PRODUCTION_COL, records.len()),
                    );
                    available.push((side_name, avg));
                }
                None => {
                    push_not_available(
                        &mut result,
                        label,
                        FindingKind::AverageProduction,
                        &side_name,
                        table.name(),
                        &filter,
                        PRODUCTION_COL,
                    );
                    gaps.push((location, crop));
                }
            }
        }

        if available.len() >= 2 {
            if let Some(hint) = leader_hint(&metric, &available) {
                result.hint(hint);
            }
        }
    }

    push_coverage_notes(ctx, &table, &mut result, &gaps, &intent.states)?;

    if result.findings.is_empty() {
        result.hint(NarrativeHint::Note {
            text: format!(
                "Nothing to compare for {}.",
                join_names(&intent.states)
            ),
        });
    }

    debug!(findings = result.findings.len(), "production_comparison processed");
    Ok(result)
}

/// Largest value wins; ties go to the alphabetically first name.
pub fn leader_hint(metric: &str, values: &[(String, f64)]) -> Option<NarrativeHint> {
    let leader = values.iter().max_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.0.cmp(&a.0))
    })?;
    Some(NarrativeHint::Leader {
        metric: metric.to_string(),
        leader: leader.0.clone(),
        compared: values.iter().map(|(name, _)| name.clone()).collect(),
    })
}
