//! Small numeric helpers: mean, least-squares slope, Pearson correlation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Relative slope (per year, as a share of the mean) below which a series
/// counts as stable.
pub const STABLE_SLOPE_RATIO: f64 = 0.005;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Least-squares slope of `value` against `year`.
///
/// `None` unless at least two distinct years are present.
pub fn linear_slope(points: &[(i32, f64)]) -> Option<f64> {
    let distinct = points
        .iter()
        .map(|(year, _)| *year)
        .collect::<std::collections::BTreeSet<_>>();
    if distinct.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| *x as f64).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| *y).sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in points {
        let dx = *x as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Pearson coefficient of two aligned series.
///
/// `None` with fewer than three pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 3 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Inner join of two yearly series on year, in year order.
pub fn align_by_year(
    left: &BTreeMap<i32, f64>,
    right: &BTreeMap<i32, f64>,
) -> Vec<(i32, f64, f64)> {
    left.iter()
        .filter_map(|(year, l)| right.get(year).map(|r| (*year, *l, *r)))
        .collect()
}

/// Sum values per year.
pub fn yearly_sum(points: impl IntoIterator<Item = (i32, f64)>) -> BTreeMap<i32, f64> {
    let mut out = BTreeMap::new();
    for (year, value) in points {
        *out.entry(year).or_insert(0.0) += value;
    }
    out
}

/// Mean value per year.
pub fn yearly_mean(points: impl IntoIterator<Item = (i32, f64)>) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (year, value) in points {
        let entry = sums.entry(year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude < 0.3 {
            CorrelationStrength::Weak
        } else if magnitude < 0.7 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Strong
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorrelationStrength::Weak => "weak",
            CorrelationStrength::Moderate => "moderate",
            CorrelationStrength::Strong => "strong",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn classify(slope: f64, mean: f64) -> Self {
        if slope.abs() <= mean.abs() * STABLE_SLOPE_RATIO {
            TrendDirection::Stable
        } else if slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        })
    }
}

/// Percent change from the first to the last value; `None` when the first
/// value is zero.
pub fn percent_change(first: f64, last: f64) -> Option<f64> {
    if first == 0.0 {
        None
    } else {
        Some((last - first) / first.abs() * 100.0)
    }
}
