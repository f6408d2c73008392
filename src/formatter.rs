//! Response Formatter - renders a QueryResult as Markdown prose
//!
//! The template is picked from the finding kinds present, never from the
//! question category. Every rendered figure is followed by its citation
//! markers (`[1]`, `[2]`, ...), which index the Sources list at the end.

use crate::execution::result::{Finding, FindingKind, FindingValue, NarrativeHint, QueryResult};
use crate::intent::RankingFocus;
use crate::routines::join_names;
use serde::{Deserialize, Serialize};

/// Layout chosen for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayTemplate {
    Clarification,
    PolicyArguments,
    Correlation,
    Trend,
    Ranking,
    Rainfall,
    Production,
    Empty,
}

impl DisplayTemplate {
    /// First template whose finding kinds appear in the result.
    pub fn select(result: &QueryResult) -> Self {
        let has = |pred: fn(&FindingKind) -> bool| result.findings.iter().any(|f| pred(&f.kind));

        if result.findings.is_empty() {
            let asks = result
                .narrative_hints
                .iter()
                .any(|h| matches!(h, NarrativeHint::Question { .. }));
            return if asks {
                DisplayTemplate::Clarification
            } else {
                DisplayTemplate::Empty
            };
        }
        if has(|k| matches!(k, FindingKind::PolicyArgument { .. })) {
            DisplayTemplate::PolicyArguments
        } else if has(|k| matches!(k, FindingKind::Correlation | FindingKind::CorrelationStrength)) {
            DisplayTemplate::Correlation
        } else if has(|k| matches!(k, FindingKind::TotalProduction)) {
            // Yearly totals listed under a total are a breakdown, not a trend.
            DisplayTemplate::Production
        } else if has(|k| matches!(k, FindingKind::YearlyValue { .. } | FindingKind::TrendDirection)) {
            DisplayTemplate::Trend
        } else if has(|k| matches!(k, FindingKind::DistrictRank { .. } | FindingKind::StateRank { .. })) {
            DisplayTemplate::Ranking
        } else if has(|k| {
            matches!(k, FindingKind::AverageRainfall | FindingKind::MonsoonRainfall)
        }) {
            DisplayTemplate::Rainfall
        } else {
            DisplayTemplate::Production
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            DisplayTemplate::Clarification => "I need a bit more information",
            DisplayTemplate::PolicyArguments => "Arguments from the data",
            DisplayTemplate::Correlation => "Rainfall and production correlation",
            DisplayTemplate::Trend => "Trend over time",
            DisplayTemplate::Ranking => "Ranking",
            DisplayTemplate::Rainfall => "Rainfall",
            DisplayTemplate::Production => "Crop production",
            DisplayTemplate::Empty => "No results",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Render a result. Deterministic: the same result always renders the
    /// same text.
    pub fn format(&self, result: &QueryResult) -> String {
        let template = DisplayTemplate::select(result);
        let mut content = format!("**{}**\n\n", template.heading());

        match template {
            DisplayTemplate::Clarification => {
                self.render_clarification(result, &mut content);
                return content.trim_end().to_string();
            }
            DisplayTemplate::Empty => {
                content.push_str("No figures could be computed for this question.\n");
            }
            DisplayTemplate::PolicyArguments => self.render_arguments(result, &mut content),
            DisplayTemplate::Ranking => self.render_ranking(result, &mut content),
            _ => {
                for finding in &result.findings {
                    content.push_str(&self.render_line(finding));
                    content.push('\n');
                }
            }
        }

        self.render_hints(result, &mut content);
        self.render_sources(result, &mut content);
        content.trim_end().to_string()
    }

    /// "[1][3]" for a finding's citations.
    fn markers(&self, finding: &Finding) -> String {
        finding.citations.iter().map(|i| format!("[{}]", i + 1)).collect()
    }

    fn caveat(&self, finding: &Finding, reason: &str) -> String {
        format!(
            "- {} is not available{}: {}.",
            capitalize(&finding.label),
            self.markers(finding),
            reason
        )
    }

    fn render_line(&self, finding: &Finding) -> String {
        match &finding.value {
            FindingValue::NotAvailable { reason } => self.caveat(finding, reason),
            FindingValue::Number { .. } if matches!(finding.kind, FindingKind::TopCrop { .. }) => {
                format!(
                    "- {}: **{}** with **{}**{}",
                    capitalize(&finding.label),
                    finding.subject,
                    finding.value,
                    self.markers(finding)
                )
            }
            value => format!(
                "- {}: **{}**{}",
                capitalize(&finding.label),
                value,
                self.markers(finding)
            ),
        }
    }

    fn render_ranking(&self, result: &QueryResult, content: &mut String) {
        for finding in &result.findings {
            match (&finding.kind, &finding.value) {
                (_, FindingValue::NotAvailable { reason }) => {
                    content.push_str(&self.caveat(finding, reason));
                }
                (FindingKind::DistrictRank { rank, focus }, value)
                | (FindingKind::StateRank { rank, focus }, value) => {
                    let word = match focus {
                        RankingFocus::Highest => "highest",
                        RankingFocus::Lowest => "lowest",
                    };
                    content.push_str(&format!(
                        "{}. **{}** ({}): **{}**{}",
                        rank,
                        finding.subject,
                        word,
                        value,
                        self.markers(finding)
                    ));
                    content.push_str(&format!(" _{}_", finding.label));
                }
                _ => content.push_str(&self.render_line(finding)),
            }
            content.push('\n');
        }
    }

    fn render_arguments(&self, result: &QueryResult, content: &mut String) {
        let mut number = 0;
        for hint in &result.narrative_hints {
            let NarrativeHint::Argument { finding, claim } = hint else {
                continue;
            };
            let Some(finding) = result.findings.get(*finding) else {
                continue;
            };
            number += 1;
            match &finding.value {
                FindingValue::NotAvailable { reason } => content.push_str(&format!(
                    "{}. {}; the figure is not available{}: {}.\n",
                    number,
                    claim,
                    self.markers(finding),
                    reason
                )),
                value => content.push_str(&format!(
                    "{}. {}: **{}**{}.\n",
                    number,
                    claim,
                    value,
                    self.markers(finding)
                )),
            }
        }
        // Findings no argument refers to still get rendered.
        for (idx, finding) in result.findings.iter().enumerate() {
            let referenced = result.narrative_hints.iter().any(|h| {
                matches!(h, NarrativeHint::Argument { finding, .. } if *finding == idx)
            });
            if !referenced {
                content.push_str(&self.render_line(finding));
                content.push('\n');
            }
        }
    }

    fn render_hints(&self, result: &QueryResult, content: &mut String) {
        let mut wrote = false;
        for hint in &result.narrative_hints {
            let line = match hint {
                NarrativeHint::Leader {
                    metric,
                    leader,
                    compared,
                } => {
                    let degree = if compared.len() > 2 { "highest" } else { "higher" };
                    format!(
                        "**{}** has the {} {} of {}.",
                        leader,
                        degree,
                        metric,
                        join_names(compared)
                    )
                }
                NarrativeHint::Note { text } => format!("_{}_", text),
                _ => continue,
            };
            if !wrote {
                content.push('\n');
                wrote = true;
            }
            content.push_str(&line);
            content.push('\n');
        }
    }

    fn render_sources(&self, result: &QueryResult, content: &mut String) {
        if result.citations.is_empty() {
            return;
        }
        content.push_str("\n**Sources**\n");
        for (idx, citation) in result.citations.iter().enumerate() {
            content.push_str(&format!(
                "[{}] {}: {}, column `{}` ({} rows)\n",
                idx + 1,
                citation.dataset_name,
                citation.row_selector_description,
                citation.column_name,
                citation.row_count
            ));
        }
    }

    fn render_clarification(&self, result: &QueryResult, content: &mut String) {
        for hint in &result.narrative_hints {
            match hint {
                NarrativeHint::Question { text } => {
                    content.push_str(text);
                    content.push_str("\n\n");
                }
                NarrativeHint::MissingInformation {
                    field,
                    description,
                    suggestions,
                } => {
                    content.push_str(&format!("- **{}**: {}", field, description));
                    if !suggestions.is_empty() {
                        let options = either_of(suggestions);
                        if field == "year_range" {
                            content.push_str(&format!(" For example: {}.", options));
                        } else {
                            content.push_str(&format!(" Did you mean {}?", options));
                        }
                    }
                    content.push('\n');
                }
                NarrativeHint::Examples { questions } if !questions.is_empty() => {
                    content.push_str("\nYou could ask, for example:\n");
                    for question in questions {
                        content.push_str(&format!("- {}\n", question));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Render with the default formatter.
pub fn format(result: &QueryResult) -> String {
    ResponseFormatter::new().format(result)
}

/// "A", "A or B", "A, B or C".
fn either_of(names: &[String]) -> String {
    match names.len() {
        0 => String::new(),
        1 => names[0].clone(),
        n => format!("{} or {}", names[..n - 1].join(", "), names[n - 1]),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::result::{Citation, Unit};

    fn rainfall_result() -> QueryResult {
        let mut result = QueryResult::new();
        result.push_finding(
            "Punjab avg annual rainfall (2019-2023)",
            FindingKind::AverageRainfall,
            "Punjab",
            FindingValue::number(640.0, Unit::Millimetres),
            Citation::new("rain", "state_name = Punjab AND year 2019-2023", "annual_rainfall_mm", 5),
        );
        result.push_finding(
            "Haryana avg annual rainfall (2019-2023)",
            FindingKind::AverageRainfall,
            "Haryana",
            FindingValue::not_available("no rows match state_name = Haryana AND year 2019-2023"),
            Citation::new("rain", "state_name = Haryana AND year 2019-2023", "annual_rainfall_mm", 0),
        );
        result
    }

    #[test]
    fn test_numbers_carry_markers_and_sources() {
        let text = format(&rainfall_result());
        assert!(text.starts_with("**Rainfall**"));
        assert!(text.contains("**640.0 mm**[1]"));
        assert!(text.contains("[1] rain: state_name = Punjab AND year 2019-2023, column `annual_rainfall_mm` (5 rows)"));
    }

    #[test]
    fn test_not_available_renders_caveat() {
        let text = format(&rainfall_result());
        assert!(text.contains("Haryana avg annual rainfall (2019-2023) is not available[2]"));
    }

    #[test]
    fn test_template_follows_finding_kinds() {
        let mut result = rainfall_result();
        assert_eq!(DisplayTemplate::select(&result), DisplayTemplate::Rainfall);
        result.push_finding(
            "r",
            FindingKind::Correlation,
            "Punjab / Rice",
            FindingValue::number(0.5, Unit::Coefficient),
            Citation::new("crops", "all rows", "production_tonnes", 3),
        );
        assert_eq!(DisplayTemplate::select(&result), DisplayTemplate::Correlation);
    }

    #[test]
    fn test_clarification_has_no_sources() {
        let mut result = QueryResult::new();
        result.hint(NarrativeHint::Question {
            text: "Which state did you mean?".to_string(),
        });
        result.hint(NarrativeHint::MissingInformation {
            field: "state".to_string(),
            description: "I don't recognize 'Pnjab'.".to_string(),
            suggestions: vec!["Punjab".to_string()],
        });
        let text = format(&result);
        assert!(text.contains("Which state did you mean?"));
        assert!(text.contains("Did you mean Punjab?"));
        assert!(!text.contains("Sources"));
    }
}
