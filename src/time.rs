//! Year scopes: explicit spans and deferred "last N years" windows.
//!
//! A relative phrase is kept as [`YearSpec::Latest`] inside the intent and is
//! only turned into concrete years by [`YearSpec::resolve`], against the max
//! year of whichever dataset a routine is about to filter.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref VAGUE_WINDOW: Regex = Regex::new(
        r"\b(?:(?:last|past|previous)\s+(?:few|several|couple of|many)|recent)\s+years\b"
    )
    .unwrap();
    static ref DECADES: Regex = Regex::new(
        r"\b(?:last|past|previous)\s+(?:(\d{1,2}|one|two|three|four|five)\s+)?decades?\b"
    )
    .unwrap();
    static ref LAST_N_YEARS: Regex = Regex::new(
        r"\b(?:last|past|previous|preceding|recent)\s+(\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty)\s+(?:available\s+|consecutive\s+)?years?\b"
    )
    .unwrap();
    static ref LATEST_YEAR: Regex = Regex::new(
        r"\b(?:last|past|previous|latest|most\s+recent)\s+(?:available\s+)?year(?:\s+available)?\b"
    )
    .unwrap();
    static ref N_YEAR: Regex = Regex::new(
        r"\b(\d{1,2}|two|three|four|five|six|seven|eight|nine|ten)\s+years?\b"
    )
    .unwrap();
    static ref YEAR_SPAN: Regex = Regex::new(
        r"\b(?:from\s+|between\s+)?((?:19|20)\d{2})\s+(?:to|and|till|until|through|thru)?\s*((?:19|20)\d{2})\b(\s+(?:tonnes?|tons?|mm|millimet(?:er|re)s?|hectares?|ha|kg|quintals?|units?))?"
    )
    .unwrap();
    static ref EXPLICIT_YEAR: Regex = Regex::new(
        r"\b((?:19|20)\d{2})\b(\s+(?:tonnes?|tons?|mm|millimet(?:er|re)s?|hectares?|ha|kg|quintals?|units?))?"
    )
    .unwrap();
}

/// Year scope carried by an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum YearSpec {
    /// Inclusive literal span.
    Between { start: i32, end: i32 },
    /// The `count` most recent years, resolved at processing time.
    Latest { count: u32 },
}

impl YearSpec {
    pub fn between(a: i32, b: i32) -> Self {
        YearSpec::Between {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn resolve(&self, max_year: i32) -> YearRange {
        match *self {
            YearSpec::Between { start, end } => YearRange::new(start, end),
            YearSpec::Latest { count } => {
                let count = count.max(1) as i32;
                YearRange::new(max_year - count + 1, max_year)
            }
        }
    }
}

/// Concrete inclusive year span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn single(year: i32) -> Self {
        Self::new(year, year)
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Decide the concrete window a routine filters on.
///
/// Precedence: the question's own scope, then the routine's default window
/// (`Some(n)` = last n years), then no restriction. Relative windows need the
/// dataset's max year; with no rows there is nothing to resolve against.
pub fn resolve_window(
    requested: Option<YearSpec>,
    default_years: Option<u32>,
    max_year: Option<i32>,
) -> Option<YearRange> {
    let spec = requested.or_else(|| default_years.map(|count| YearSpec::Latest { count }))?;
    match spec {
        YearSpec::Between { .. } => Some(spec.resolve(0)),
        YearSpec::Latest { .. } => max_year.map(|max| spec.resolve(max)),
    }
}

/// Outcome of scanning a normalized question for year references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearExtraction {
    pub spec: Option<YearSpec>,
    /// Set when a time reference was found that cannot be pinned down.
    pub unresolved: Option<String>,
    /// Byte spans of the normalized text that were consumed.
    pub consumed: Vec<(usize, usize)>,
}

/// Find explicit years, spans and relative windows in normalized text.
///
/// Explicit years win over relative phrases when both appear.
pub fn extract_years(normalized: &str) -> YearExtraction {
    let mut out = YearExtraction::default();
    let mut relative: Option<YearSpec> = None;

    if let Some(m) = VAGUE_WINDOW.find(normalized) {
        out.unresolved = Some(format!(
            "'{}' does not say how many years",
            m.as_str()
        ));
        out.consumed.push((m.start(), m.end()));
    }

    for caps in DECADES.captures_iter(normalized) {
        let whole = caps.get(0).map(|m| (m.start(), m.end()));
        let decades = caps.get(1).map(|m| parse_count(m.as_str())).unwrap_or(Some(1));
        if let Some((start, end)) = whole {
            if overlaps(&out.consumed, start, end) {
                continue;
            }
            out.consumed.push((start, end));
        }
        relative = relative.or(decades.map(|d| YearSpec::Latest { count: d * 10 }));
    }

    for caps in LAST_N_YEARS.captures_iter(normalized) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&out.consumed, whole.start(), whole.end()) {
            continue;
        }
        out.consumed.push((whole.start(), whole.end()));
        match caps.get(1).and_then(|m| parse_count(m.as_str())) {
            Some(0) | None => {
                out.unresolved = Some(format!(
                    "'{}' needs a positive number of years",
                    whole.as_str()
                ));
            }
            Some(count) => relative = relative.or(Some(YearSpec::Latest { count })),
        }
    }

    for m in LATEST_YEAR.find_iter(normalized) {
        if overlaps(&out.consumed, m.start(), m.end()) {
            continue;
        }
        out.consumed.push((m.start(), m.end()));
        relative = relative.or(Some(YearSpec::Latest { count: 1 }));
    }

    for caps in N_YEAR.captures_iter(normalized) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&out.consumed, whole.start(), whole.end()) {
            continue;
        }
        if let Some(count) = caps.get(1).and_then(|m| parse_count(m.as_str())).filter(|c| *c > 0) {
            out.consumed.push((whole.start(), whole.end()));
            relative = relative.or(Some(YearSpec::Latest { count }));
        }
    }

    let mut explicit: Vec<i32> = Vec::new();
    let mut quantities: Vec<(usize, usize)> = Vec::new();
    for caps in YEAR_SPAN.captures_iter(normalized) {
        let Some(whole) = caps.get(0) else { continue };
        // "between 1500 and 2000 tonnes" is a quantity, not a span.
        if caps.get(3).is_some() {
            quantities.push((whole.start(), whole.end()));
            continue;
        }
        out.consumed.push((whole.start(), whole.end()));
        for idx in [1, 2] {
            if let Some(year) = caps.get(idx).and_then(|m| m.as_str().parse::<i32>().ok()) {
                explicit.push(year);
            }
        }
    }
    for caps in EXPLICIT_YEAR.captures_iter(normalized) {
        let Some(m) = caps.get(1) else { continue };
        // "2000 tonnes" is a quantity.
        if caps.get(2).is_some()
            || overlaps(&quantities, m.start(), m.end())
            || overlaps(&out.consumed, m.start(), m.end())
        {
            continue;
        }
        if let Ok(year) = m.as_str().parse::<i32>() {
            out.consumed.push((m.start(), m.end()));
            explicit.push(year);
        }
    }

    let explicit_spec = match (explicit.iter().min(), explicit.iter().max()) {
        (Some(&lo), Some(&hi)) => Some(YearSpec::between(lo, hi)),
        _ => None,
    };

    out.spec = explicit_spec.or(relative);
    out.consumed.sort_unstable();
    out
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

fn parse_count(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return Some(n);
    }
    let n = match token {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        _ => return None,
    };
    Some(n)
}

/// Parse a count word or digits (shared with the top-N extraction).
pub fn count_from_token(token: &str) -> Option<u32> {
    parse_count(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_n_years_is_deferred() {
        let found = extract_years("average wheat production in karnataka over the last 3 years");
        assert_eq!(found.spec, Some(YearSpec::Latest { count: 3 }));
        assert_eq!(found.unresolved, None);
        assert_eq!(
            found.spec.unwrap().resolve(2023),
            YearRange { start: 2021, end: 2023 }
        );
        // Same intent, refreshed dataset.
        assert_eq!(
            found.spec.unwrap().resolve(2024),
            YearRange { start: 2022, end: 2024 }
        );
    }

    #[test]
    fn test_relative_phrases() {
        assert_eq!(
            extract_years("rice in punjab over the last decade").spec,
            Some(YearSpec::Latest { count: 10 })
        );
        assert_eq!(
            extract_years("in the most recent year available").spec,
            Some(YearSpec::Latest { count: 1 })
        );
        assert_eq!(
            extract_years("for the last five available years").spec,
            Some(YearSpec::Latest { count: 5 })
        );
        assert_eq!(
            extract_years("5 year wheat production in haryana").spec,
            Some(YearSpec::Latest { count: 5 })
        );
        assert_eq!(
            extract_years("rainfall in punjab last year").spec,
            Some(YearSpec::Latest { count: 1 })
        );
    }

    #[test]
    fn test_explicit_years_and_spans() {
        assert_eq!(
            extract_years("rice in haryana from 2020 to 2023").spec,
            Some(YearSpec::Between { start: 2020, end: 2023 })
        );
        // "2015-2020" normalizes to "2015 2020"
        assert_eq!(
            extract_years("wheat 2015 2020").spec,
            Some(YearSpec::Between { start: 2015, end: 2020 })
        );
        assert_eq!(
            extract_years("punjab rainfall in 2023").spec,
            Some(YearSpec::Between { start: 2023, end: 2023 })
        );
        assert_eq!(
            extract_years("between 2022 and 2018").spec,
            Some(YearSpec::Between { start: 2018, end: 2022 })
        );
    }

    #[test]
    fn test_quantities_are_not_years() {
        assert_eq!(
            extract_years("which state produced over 2000 tonnes of rice").spec,
            None
        );
        assert_eq!(extract_years("districts with 1900 mm of rain").spec, None);
        assert_eq!(
            extract_years("states above 2000 tonnes of wheat in 2021").spec,
            Some(YearSpec::Between { start: 2021, end: 2021 })
        );
        assert_eq!(
            extract_years("between 1999 and 2005 hectares of cotton").spec,
            None
        );
    }

    #[test]
    fn test_explicit_beats_relative() {
        let found = extract_years("last 5 years up to 2019");
        assert_eq!(found.spec, Some(YearSpec::Between { start: 2019, end: 2019 }));
    }

    #[test]
    fn test_unresolvable_references() {
        assert!(extract_years("rice output over the last few years").unresolved.is_some());
        assert!(extract_years("wheat in recent years").unresolved.is_some());
        assert!(extract_years("the last 0 years").unresolved.is_some());
        assert!(extract_years("wheat in punjab").unresolved.is_none());
    }

    #[test]
    fn test_consumed_spans_cover_phrase() {
        let text = "rice in the most recent year";
        let found = extract_years(text);
        let (start, end) = found.consumed[0];
        assert_eq!(&text[start..end], "most recent year");
    }

    #[test]
    fn test_resolve_window_precedence() {
        let explicit = Some(YearSpec::between(2010, 2012));
        assert_eq!(
            resolve_window(explicit, Some(5), Some(2023)),
            Some(YearRange::new(2010, 2012))
        );
        assert_eq!(
            resolve_window(None, Some(5), Some(2023)),
            Some(YearRange::new(2019, 2023))
        );
        assert_eq!(resolve_window(None, None, Some(2023)), None);
        assert_eq!(resolve_window(None, Some(5), None), None);
    }

    #[test]
    fn test_year_range_display() {
        assert_eq!(YearRange::new(2023, 2021).to_string(), "2021-2023");
        assert_eq!(YearRange::single(2020).to_string(), "2020");
    }
}
