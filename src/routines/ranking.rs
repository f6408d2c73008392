//! District and state rankings by a crop's total production.

use super::{citation, production_by, push_not_available, scope_label, window, ProcessingContext};
use crate::dataset::{RowFilter, PRODUCTION_COL};
use crate::error::Result;
use crate::execution::result::{FindingKind, FindingValue, QueryResult, Unit};
use crate::intent::{QueryIntent, RankingFocus};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

fn focus_word(focus: RankingFocus) -> &'static str {
    match focus {
        RankingFocus::Highest => "highest",
        RankingFocus::Lowest => "lowest",
    }
}

/// Order entities for a ranking.
///
/// Highest: descending by value. Lowest: ascending. Ties always go to the
/// alphabetically first name, so equal totals rank the same way every run.
pub fn rank(totals: BTreeMap<String, f64>, focus: RankingFocus) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| {
        let by_value = match focus {
            RankingFocus::Highest => b.1.partial_cmp(&a.1),
            RankingFocus::Lowest => a.1.partial_cmp(&b.1),
        };
        by_value.unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
    });
    ranked
}

/// Districts ranked by a crop's production, per requested state.
///
/// With paired focus ("highest in Punjab and lowest in Haryana") each state
/// gets its own focus; otherwise every mentioned focus applies to every state.
pub fn process_district_ranking(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let table = ctx.datasets.crop_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.district_ranking_years,
        table.max_year()?,
    );
    let top_n = intent.top_n.unwrap_or(ctx.defaults.top_n).max(1) as usize;
    let mut result = QueryResult::new();

    let scopes: Vec<Option<&String>> = if intent.states.is_empty() {
        vec![None]
    } else {
        intent.states.iter().map(Some).collect()
    };

    for (idx, state) in scopes.iter().enumerate() {
        let focuses = if intent.has_paired_focus() {
            vec![intent.focus_for(idx)]
        } else {
            intent.distinct_focus()
        };
        let place = state.map(|s| s.as_str()).unwrap_or("India");

        for crop in &intent.crops {
            let mut filter = RowFilter::new().crop(crop).years(range);
            if let Some(s) = state {
                filter = filter.state(s);
            }
            let records = table.select(&filter)?;
            let scope = scope_label(range, records.iter().map(|r| r.year));

            for focus in &focuses {
                if records.is_empty() {
                    push_not_available(
                        &mut result,
                        format!("{} {} {} districts {}", place, focus_word(*focus), crop, scope),
                        FindingKind::DistrictRank { rank: 1, focus: *focus },
                        place,
                        table.name(),
                        &filter,
                        PRODUCTION_COL,
                    );
                    continue;
                }

                let totals = production_by(&records, |r| ctx.district_name(&r.district));
                for (pos, (district, total)) in rank(totals, *focus).into_iter().take(top_n).enumerate() {
                    let rows = records
                        .iter()
                        .filter(|r| ctx.district_name(&r.district) == district)
                        .count();
                    result.push_finding(
                        format!(
                            "{} #{} {} {} district {}",
                            place,
                            pos + 1,
                            focus_word(*focus),
                            crop,
                            scope
                        ),
                        FindingKind::DistrictRank {
                            rank: pos + 1,
                            focus: *focus,
                        },
                        district.clone(),
                        FindingValue::number(total, Unit::Tonnes),
                        citation(table.name(), &filter.clone().district(&district), PRODUCTION_COL, rows),
                    );
                }
            }
        }
    }

    debug!(findings = result.findings.len(), "district_ranking processed");
    Ok(result)
}

/// States ranked by a crop's total production over the window.
pub fn process_state_ranking(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let table = ctx.datasets.crop_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.state_ranking_years,
        table.max_year()?,
    );
    let top_n = intent.top_n.unwrap_or(ctx.defaults.top_n).max(1) as usize;
    let mut result = QueryResult::new();

    for crop in &intent.crops {
        // Named states narrow the candidates.
        let filter = RowFilter::new()
            .crop(crop)
            .states(&intent.states)
            .years(range);
        let records = table.select(&filter)?;
        let scope = scope_label(range, records.iter().map(|r| r.year));

        for focus in intent.distinct_focus() {
            if records.is_empty() {
                push_not_available(
                    &mut result,
                    format!("{} {} states {}", focus_word(focus), crop, scope),
                    FindingKind::StateRank { rank: 1, focus },
                    crop,
                    table.name(),
                    &filter,
                    PRODUCTION_COL,
                );
                continue;
            }

            let totals = production_by(&records, |r| ctx.state_name(&r.state));
            for (pos, (state, total)) in rank(totals, focus).into_iter().take(top_n).enumerate() {
                let rows = records
                    .iter()
                    .filter(|r| ctx.state_name(&r.state) == state)
                    .count();
                result.push_finding(
                    format!("#{} {} {} state {}", pos + 1, focus_word(focus), crop, scope),
                    FindingKind::StateRank {
                        rank: pos + 1,
                        focus,
                    },
                    state.clone(),
                    FindingValue::number(total, Unit::Tonnes),
                    citation(table.name(), &filter.clone().state(&state), PRODUCTION_COL, rows),
                );
            }
        }
    }

    debug!(findings = result.findings.len(), "state_ranking processed");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_rank_highest_breaks_ties_by_name() {
        let ranked = rank(
            totals(&[("Sirsa", 5.0), ("Ambala", 5.0), ("Karnal", 9.0)]),
            RankingFocus::Highest,
        );
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Karnal", "Ambala", "Sirsa"]);
    }

    #[test]
    fn test_rank_lowest() {
        let ranked = rank(
            totals(&[("Sirsa", 5.0), ("Ambala", 5.0), ("Karnal", 1.0)]),
            RankingFocus::Lowest,
        );
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Karnal", "Ambala", "Sirsa"]);
    }
}
