//! Query Result - findings, citations and narrative hints for one question

use crate::intent::RankingFocus;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Millimetres,
    Tonnes,
    TonnesPerYear,
    MillimetresPerYear,
    Percent,
    Coefficient,
    Years,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Millimetres => " mm",
            Unit::Tonnes => " tonnes",
            Unit::TonnesPerYear => " tonnes/year",
            Unit::MillimetresPerYear => " mm/year",
            Unit::Percent => "%",
            Unit::Coefficient => "",
            Unit::Years => " years",
        }
    }

    fn decimals(&self) -> usize {
        match self {
            Unit::Coefficient => 2,
            Unit::Years => 0,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingValue {
    Number { value: f64, unit: Unit },
    Text { value: String },
    /// No supporting rows, or too few to compute the figure.
    NotAvailable { reason: String },
}

impl FindingValue {
    pub fn number(value: f64, unit: Unit) -> Self {
        FindingValue::Number { value, unit }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FindingValue::Text {
            value: value.into(),
        }
    }

    pub fn not_available(reason: impl Into<String>) -> Self {
        FindingValue::NotAvailable {
            reason: reason.into(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FindingValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, FindingValue::NotAvailable { .. })
    }
}

impl fmt::Display for FindingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingValue::Number { value, unit } => {
                write!(f, "{}{}", group_thousands(*value, unit.decimals()), unit.suffix())
            }
            FindingValue::Text { value } => f.write_str(value),
            FindingValue::NotAvailable { .. } => f.write_str("not available"),
        }
    }
}

/// `1234567.891` -> `1,234,567.9` with one decimal.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (formatted.clone(), None),
    };
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// What a finding measures. The formatter picks its templates from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    AverageRainfall,
    MonsoonRainfall,
    AverageProduction,
    TotalProduction,
    TopCrop { rank: usize },
    DistrictRank { rank: usize, focus: RankingFocus },
    StateRank { rank: usize, focus: RankingFocus },
    YearlyValue { year: i32 },
    TrendSlope,
    TrendDirection,
    PercentChange,
    Correlation,
    CorrelationStrength,
    OverlapYears,
    PolicyArgument { index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Short unique label, e.g. "avg Wheat production in Karnataka (2021-2023)"
    pub label: String,
    pub kind: FindingKind,
    /// Entity (or entity pair) the value is about
    pub subject: String,
    pub value: FindingValue,
    /// Indices into `QueryResult::citations`
    pub citations: Vec<usize>,
}

/// Pointer from a finding to the rows and column that justify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub dataset_name: String,
    pub row_selector_description: String,
    pub column_name: String,
    /// Rows the selector matched; zero for "not available" findings.
    pub row_count: usize,
}

impl Citation {
    pub fn new(
        dataset_name: &str,
        row_selector_description: impl Into<String>,
        column_name: &str,
        row_count: usize,
    ) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            row_selector_description: row_selector_description.into(),
            column_name: column_name.to_string(),
            row_count,
        }
    }
}

/// Facts used only for wording the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrativeHint {
    /// `leader` has the larger value of `metric` among `compared`.
    Leader {
        metric: String,
        leader: String,
        compared: Vec<String>,
    },
    MissingInformation {
        field: String,
        description: String,
        suggestions: Vec<String>,
    },
    /// Policy argument; the figure lives in the referenced finding.
    Argument { finding: usize, claim: String },
    Question { text: String },
    Examples { questions: Vec<String> },
    Note { text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub findings: Vec<Finding>,
    pub citations: Vec<Citation>,
    pub narrative_hints: Vec<NarrativeHint>,
}

impl QueryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a citation, reusing an identical one. Returns its index.
    pub fn cite(&mut self, citation: Citation) -> usize {
        if let Some(idx) = self.citations.iter().position(|c| c == &citation) {
            return idx;
        }
        self.citations.push(citation);
        self.citations.len() - 1
    }

    /// Add a finding backed by one citation. Returns the finding index.
    pub fn push_finding(
        &mut self,
        label: impl Into<String>,
        kind: FindingKind,
        subject: impl Into<String>,
        value: FindingValue,
        citation: Citation,
    ) -> usize {
        self.push_finding_cited(label, kind, subject, value, vec![citation])
    }

    pub fn push_finding_cited(
        &mut self,
        label: impl Into<String>,
        kind: FindingKind,
        subject: impl Into<String>,
        value: FindingValue,
        citations: Vec<Citation>,
    ) -> usize {
        let citations = citations.into_iter().map(|c| self.cite(c)).collect();
        self.findings.push(Finding {
            label: label.into(),
            kind,
            subject: subject.into(),
            value,
            citations,
        });
        self.findings.len() - 1
    }

    pub fn hint(&mut self, hint: NarrativeHint) {
        self.narrative_hints.push(hint);
    }

    pub fn finding(&self, label: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.label == label)
    }

    pub fn findings_of<'a>(
        &'a self,
        pred: impl Fn(&FindingKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| pred(&f.kind))
    }

    /// Every finding has at least one citation and every index resolves.
    pub fn is_fully_cited(&self) -> bool {
        self.findings.iter().all(|f| {
            !f.citations.is_empty() && f.citations.iter().all(|&i| i < self.citations.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(
            FindingValue::number(1234567.891, Unit::Tonnes).to_string(),
            "1,234,567.9 tonnes"
        );
        assert_eq!(FindingValue::number(812.44, Unit::Millimetres).to_string(), "812.4 mm");
        assert_eq!(FindingValue::number(-0.456, Unit::Coefficient).to_string(), "-0.46");
        assert_eq!(FindingValue::number(-12.5, Unit::Percent).to_string(), "-12.5%");
        assert_eq!(FindingValue::not_available("no rows").to_string(), "not available");
    }

    #[test]
    fn test_identical_citations_are_shared() {
        let mut result = QueryResult::new();
        let citation = Citation::new("rain", "state_name = Punjab", "annual_rainfall_mm", 5);
        result.push_finding(
            "a",
            FindingKind::AverageRainfall,
            "Punjab",
            FindingValue::number(1.0, Unit::Millimetres),
            citation.clone(),
        );
        result.push_finding(
            "b",
            FindingKind::TrendSlope,
            "Punjab",
            FindingValue::number(1.0, Unit::MillimetresPerYear),
            citation,
        );
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.findings[1].citations, vec![0]);
        assert!(result.is_fully_cited());
    }

    #[test]
    fn test_uncited_finding_detected() {
        let mut result = QueryResult::new();
        result.findings.push(Finding {
            label: "x".into(),
            kind: FindingKind::Correlation,
            subject: "Punjab".into(),
            value: FindingValue::not_available("no rows"),
            citations: vec![],
        });
        assert!(!result.is_fully_cited());
    }
}
