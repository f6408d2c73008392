//! Rainfall vs production correlation over the years both series share.

use super::{citation, scope_label, window, ProcessingContext};
use crate::dataset::{RowFilter, PRODUCTION_COL, RAINFALL_COL};
use crate::error::Result;
use crate::execution::result::{FindingKind, FindingValue, QueryResult, Unit};
use crate::intent::QueryIntent;
use crate::stats::{align_by_year, pearson, yearly_mean, yearly_sum, CorrelationStrength};
use tracing::debug;

pub const MIN_OVERLAP_YEARS: usize = 3;

/// Pearson r between a state's annual rainfall and a crop's production,
/// aligned by year (inner join).
///
/// Without a state the series are national: production summed across
/// states, rainfall averaged across states.
pub fn process_correlation_query(ctx: &ProcessingContext, intent: &QueryIntent) -> Result<QueryResult> {
    let crops = ctx.datasets.crop_table()?;
    let rain = ctx.datasets.rainfall_table()?;
    let range = window(
        intent.year_range,
        ctx.defaults.correlation_years,
        crops.max_year()?,
    );
    let mut result = QueryResult::new();

    let places: Vec<Option<&String>> = if intent.states.is_empty() {
        vec![None]
    } else {
        intent.states.iter().map(Some).collect()
    };

    for crop in &intent.crops {
        for place in &places {
            let mut crop_filter = RowFilter::new().crop(crop).years(range);
            let mut rain_filter = RowFilter::new().years(range);
            if let Some(s) = place {
                crop_filter = crop_filter.state(s);
                rain_filter = rain_filter.state(s);
            }
            let where_ = place.map(|s| s.as_str()).unwrap_or("India");

            let crop_rows = crops.select(&crop_filter)?;
            let rain_rows = rain.select(&rain_filter)?;
            let production = yearly_sum(crop_rows.iter().map(|r| (r.year, r.production_tonnes)));
            let rainfall = yearly_mean(rain_rows.iter().map(|r| (r.year, r.annual_rainfall_mm)));
            let aligned = align_by_year(&rainfall, &production);
            let scope = scope_label(range, aligned.iter().map(|(y, _, _)| *y));

            let citations = vec![
                citation(crops.name(), &crop_filter, PRODUCTION_COL, crop_rows.len()),
                citation(rain.name(), &rain_filter, RAINFALL_COL, rain_rows.len()),
            ];
            let subject = format!("{} / {}", where_, crop);

            result.push_finding_cited(
                format!("overlapping years for rainfall and {} in {} {}", crop, where_, scope),
                FindingKind::OverlapYears,
                subject.clone(),
                FindingValue::number(aligned.len() as f64, Unit::Years),
                citations.clone(),
            );

            let pairs: Vec<(f64, f64)> = aligned.iter().map(|(_, r, p)| (*r, *p)).collect();
            let label = format!(
                "rainfall vs {} production correlation in {} {}",
                crop, where_, scope
            );
            match pearson(&pairs) {
                Some(r) => {
                    result.push_finding_cited(
                        label,
                        FindingKind::Correlation,
                        subject.clone(),
                        FindingValue::number(r, Unit::Coefficient),
                        citations.clone(),
                    );
                    let strength = CorrelationStrength::from_coefficient(r);
                    let sign = if r >= 0.0 { "positive" } else { "negative" };
                    result.push_finding_cited(
                        format!(
                            "rainfall vs {} production correlation strength in {} {}",
                            crop, where_, scope
                        ),
                        FindingKind::CorrelationStrength,
                        subject,
                        FindingValue::text(format!("{} {}", strength, sign)),
                        citations,
                    );
                }
                None => {
                    let reason = if aligned.len() < MIN_OVERLAP_YEARS {
                        format!(
                            "only {} overlapping year(s) between {} and {}; at least {} are needed",
                            aligned.len(),
                            crop_filter.describe(),
                            rain_filter.describe(),
                            MIN_OVERLAP_YEARS
                        )
                    } else {
                        "one of the series does not vary over the overlapping years".to_string()
                    };
                    result.push_finding_cited(
                        label,
                        FindingKind::Correlation,
                        subject,
                        FindingValue::not_available(reason),
                        citations,
                    );
                }
            }
        }
    }

    debug!(findings = result.findings.len(), "correlation_query processed");
    Ok(result)
}
