//! Processing routines, one per question category.
//!
//! Every routine reads the shared datasets through a [`ProcessingContext`]
//! and returns a fresh [`QueryResult`]. "No data" is reported through
//! not-available findings; the only error a routine raises is a schema
//! violation in the dataset it reads.

pub mod clarification;
pub mod correlation;
pub mod policy;
pub mod production;
pub mod rainfall;
pub mod ranking;
pub mod trend;

use crate::catalog::EntityCatalog;
use crate::config::AnalysisDefaults;
use crate::dataset::{CropRecord, CropTable, Datasets, RainfallTable, RowFilter};
use crate::error::Result;
use crate::execution::result::{Citation, FindingKind, FindingValue, NarrativeHint, QueryResult};
use crate::time::{resolve_window, YearRange, YearSpec};
use std::collections::{BTreeMap, BTreeSet};

/// States a coverage note names before summarizing the rest.
const COVERAGE_PREVIEW: usize = 5;

/// Read-only inputs shared by every routine for one question.
pub struct ProcessingContext<'a> {
    pub datasets: &'a Datasets,
    pub catalog: &'a EntityCatalog,
    pub defaults: &'a AnalysisDefaults,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(
        datasets: &'a Datasets,
        catalog: &'a EntityCatalog,
        defaults: &'a AnalysisDefaults,
    ) -> Self {
        Self {
            datasets,
            catalog,
            defaults,
        }
    }

    pub fn crop_dataset(&self) -> &str {
        &self.datasets.crop_dataset_name
    }

    pub fn rainfall_dataset(&self) -> &str {
        &self.datasets.rainfall_dataset_name
    }

    /// Catalog spelling of a state read from a dataset, or the value as is.
    pub fn state_name(&self, raw: &str) -> String {
        self.catalog
            .canonical_state(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn district_name(&self, raw: &str) -> String {
        self.catalog
            .canonical_district(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }

    pub fn crop_name(&self, raw: &str) -> String {
        self.catalog
            .canonical_crop(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }
}

/// Window for a routine: the question's span, else the routine default,
/// resolved against `max_year` of the dataset being filtered.
pub fn window(
    requested: Option<YearSpec>,
    default_years: Option<u32>,
    max_year: Option<i32>,
) -> Option<YearRange> {
    resolve_window(requested, default_years, max_year)
}

/// "(2021-2023)" for a window; for an open window the span actually covered
/// by `years`, or "(all years)" when nothing matched.
pub fn scope_label(range: Option<YearRange>, years: impl IntoIterator<Item = i32>) -> String {
    if let Some(range) = range {
        return format!("({})", range);
    }
    let mut years = years.into_iter();
    match years.next() {
        Some(first) => {
            let (lo, hi) = years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
            format!("({})", YearRange::new(lo, hi))
        }
        None => "(all years)".to_string(),
    }
}

/// Citation for `column` over the rows `filter` selected.
pub fn citation(dataset: &str, filter: &RowFilter, column: &str, rows: usize) -> Citation {
    Citation::new(dataset, filter.describe(), column, rows)
}

/// Reason text for a filter that matched nothing.
pub fn no_rows_reason(filter: &RowFilter) -> String {
    format!("no rows match {}", filter.describe())
}

/// Push a not-available finding whose citation states the empty filter.
pub fn push_not_available(
    result: &mut QueryResult,
    label: String,
    kind: FindingKind,
    subject: &str,
    dataset: &str,
    filter: &RowFilter,
    column: &str,
) -> usize {
    result.push_finding(
        label,
        kind,
        subject,
        FindingValue::not_available(no_rows_reason(filter)),
        citation(dataset, filter, column, 0),
    )
}

/// Total production per key, keyed by the canonical name `key_of` returns.
pub fn production_by<F>(records: &[CropRecord], key_of: F) -> BTreeMap<String, f64>
where
    F: Fn(&CropRecord) -> String,
{
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(key_of(record)).or_insert(0.0) += record.production_tonnes;
    }
    totals
}

/// (state, year) pairs that have crop rows, optionally for one crop.
pub fn crop_coverage(
    ctx: &ProcessingContext,
    table: &CropTable,
    crop: Option<&str>,
) -> Result<Vec<(String, i32)>> {
    let filter = match crop {
        Some(c) => RowFilter::new().crop(c),
        None => RowFilter::new(),
    };
    Ok(table
        .select(&filter)?
        .iter()
        .map(|r| (ctx.state_name(&r.state), r.year))
        .collect())
}

/// (state, year) pairs that have rainfall rows.
pub fn rainfall_coverage(ctx: &ProcessingContext, table: &RainfallTable) -> Result<Vec<(String, i32)>> {
    Ok(table
        .select(&RowFilter::new())?
        .iter()
        .map(|r| (ctx.state_name(&r.state), r.year))
        .collect())
}

/// Guidance after an empty selection for `what` ("Wheat production",
/// "Rainfall"). When `missing_state` has rows outside the window the note
/// gives its years; otherwise it lists the states that do have rows and
/// suggests one the question did not name.
pub fn coverage_note(
    what: &str,
    coverage: &[(String, i32)],
    missing_state: Option<&str>,
    asked: &[String],
) -> NarrativeHint {
    if let Some(state) = missing_state {
        let own: Vec<i32> = coverage
            .iter()
            .filter(|(s, _)| s == state)
            .map(|(_, y)| *y)
            .collect();
        if !own.is_empty() {
            return NarrativeHint::Note {
                text: format!("{} rows for {} cover {} only.", what, state, year_span(own)),
            };
        }
    }

    let states: BTreeSet<&str> = coverage.iter().map(|(s, _)| s.as_str()).collect();
    if states.is_empty() {
        return NarrativeHint::Note {
            text: format!("No {} rows exist for any state.", what.to_lowercase()),
        };
    }

    let mut preview: Vec<String> = states.iter().take(COVERAGE_PREVIEW).map(|s| s.to_string()).collect();
    if states.len() > COVERAGE_PREVIEW {
        preview.push(format!("{} more", states.len() - COVERAGE_PREVIEW));
    }
    let mut text = format!(
        "{} data covers {} ({}).",
        what,
        join_names(&preview),
        year_span(coverage.iter().map(|(_, y)| *y))
    );
    let unasked = states
        .iter()
        .find(|s| !asked.iter().any(|a| a.eq_ignore_ascii_case(s)));
    if let Some(state) = unasked {
        text.push_str(&format!(" Try asking about {} in {}.", what.to_lowercase(), state));
    }
    NarrativeHint::Note { text }
}

fn year_span(years: impl IntoIterator<Item = i32>) -> String {
    let years: BTreeSet<i32> = years.into_iter().collect();
    match (years.first(), years.last()) {
        (Some(&lo), Some(&hi)) => YearRange::new(lo, hi).to_string(),
        _ => String::new(),
    }
}

/// Human list: "Punjab", "Punjab and Haryana", "A, B and C".
pub fn join_names(names: &[String]) -> String {
    match names.len() {
        0 => String::new(),
        1 => names[0].clone(),
        n => format!("{} and {}", names[..n - 1].join(", "), names[n - 1]),
    }
}
