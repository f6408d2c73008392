mod common;

use agri_insight::dataset::Datasets;
use agri_insight::execution::result::{FindingKind, FindingValue, NarrativeHint};
use agri_insight::intent::{QueryCategory, QueryIntent, RankingFocus};
use common::{crop_df, datasets, engine, engine_with, rainfall_df};

#[test]
fn test_paired_district_ranking() {
    let answer = engine()
        .ask("Which district has the highest Wheat production in Punjab and the lowest in Haryana?")
        .unwrap();

    assert_eq!(answer.intent.category, QueryCategory::DistrictRanking);
    let ranks: Vec<_> = answer
        .result
        .findings_of(|k| matches!(k, FindingKind::DistrictRank { .. }))
        .collect();
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks[0].subject, "Ludhiana");
    assert_eq!(
        ranks[0].kind,
        FindingKind::DistrictRank {
            rank: 1,
            focus: RankingFocus::Highest
        }
    );
    assert_eq!(ranks[1].subject, "Hisar");
    assert_eq!(
        ranks[1].kind,
        FindingKind::DistrictRank {
            rank: 1,
            focus: RankingFocus::Lowest
        }
    );
}

#[test]
fn test_district_ties_are_alphabetical_and_stable() {
    let engine = engine();
    let question = "Top 2 districts for Wheat in Haryana";
    let first = engine.ask(question).unwrap();
    let names: Vec<&str> = first
        .result
        .findings
        .iter()
        .map(|f| f.subject.as_str())
        .collect();
    // Karnal and Sirsa both produced 250 tonnes.
    assert_eq!(names, vec!["Karnal", "Sirsa"]);

    for _ in 0..5 {
        assert_eq!(engine.ask(question).unwrap(), first);
    }
}

#[test]
fn test_trend_over_last_decade() {
    let answer = engine()
        .ask("How has Rice production changed in Punjab over the last decade?")
        .unwrap();

    assert_eq!(answer.intent.category, QueryCategory::TrendAnalysis);
    let yearly: Vec<_> = answer
        .result
        .findings_of(|k| matches!(k, FindingKind::YearlyValue { .. }))
        .collect();
    assert_eq!(yearly.len(), 5);

    let slope = answer
        .result
        .finding("Rice production in Punjab trend (2014-2023)")
        .unwrap();
    assert!((slope.value.as_number().unwrap() - 20.0).abs() < 1e-9);

    let direction = answer
        .result
        .findings_of(|k| *k == FindingKind::TrendDirection)
        .next()
        .unwrap();
    assert_eq!(direction.value, FindingValue::text("increasing"));

    let change = answer
        .result
        .findings_of(|k| *k == FindingKind::PercentChange)
        .next()
        .unwrap();
    assert!((change.value.as_number().unwrap() - 20.0).abs() < 1e-9);
}

#[test]
fn test_trend_with_single_year_is_not_available() {
    let answer = engine()
        .ask("Trend of Sugarcane production in Uttar Pradesh")
        .unwrap();

    let slope = answer
        .result
        .findings_of(|k| *k == FindingKind::TrendSlope)
        .next()
        .unwrap();
    assert!(!slope.value.is_available());
    assert!(answer.result.is_fully_cited());
}

#[test]
fn test_policy_arguments_each_cited() {
    let answer = engine()
        .ask("Give arguments to promote drought-resistant crops in Maharashtra")
        .unwrap();

    assert_eq!(answer.intent.category, QueryCategory::PolicySupport);
    let arguments: Vec<_> = answer
        .result
        .findings_of(|k| matches!(k, FindingKind::PolicyArgument { .. }))
        .collect();
    assert_eq!(arguments.len(), 3);
    assert!(arguments.iter().all(|f| f.citations.len() == 1));

    // Rainfall falls 50 mm a year.
    assert!((arguments[0].value.as_number().unwrap() + 50.0).abs() < 1e-9);
    // Jowar + Bajra: 80 -> 100 tonnes.
    assert!((arguments[1].value.as_number().unwrap() - 25.0).abs() < 1e-9);
    // 450 of 990 tonnes against Rice and Sugarcane.
    let share = arguments[2].value.as_number().unwrap();
    assert!((share - 450.0 / 990.0 * 100.0).abs() < 1e-9);

    let claims = answer
        .result
        .narrative_hints
        .iter()
        .filter(|h| matches!(h, NarrativeHint::Argument { .. }))
        .count();
    assert_eq!(claims, 3);
    assert!(answer.text.contains("1. Annual rainfall in Maharashtra has been falling"));
}

#[test]
fn test_policy_argument_count_follows_question() {
    let answer = engine()
        .ask("Give two arguments to promote millets in Maharashtra")
        .unwrap();
    assert_eq!(answer.result.findings.len(), 2);
}

#[test]
fn test_policy_honours_top_n() {
    let answer = engine()
        .ask("Promote millets in Maharashtra, top 2 only")
        .unwrap();
    assert_eq!(answer.intent.category, QueryCategory::PolicySupport);
    assert_eq!(answer.intent.top_n, Some(2));
    assert_eq!(answer.result.findings.len(), 2);
}

#[test]
fn test_missing_data_is_reported_not_raised() {
    let answer = engine()
        .ask("What is the average Wheat production in Kerala?")
        .unwrap();

    assert_eq!(answer.result.findings.len(), 1);
    let finding = &answer.result.findings[0];
    assert!(matches!(finding.value, FindingValue::NotAvailable { .. }));
    let citation = &answer.result.citations[finding.citations[0]];
    assert_eq!(citation.row_count, 0);
    assert!(citation
        .row_selector_description
        .starts_with("state_name = Kerala AND crop_name = Wheat"));
    assert!(answer.text.contains("is not available[1]"));
}

#[test]
fn test_missing_data_points_at_available_coverage() {
    let notes = |question: &str| -> Vec<String> {
        engine()
            .ask(question)
            .unwrap()
            .result
            .narrative_hints
            .into_iter()
            .filter_map(|h| match h {
                NarrativeHint::Note { text } => Some(text),
                _ => None,
            })
            .collect()
    };

    let wheat = notes("What is the average Wheat production in Kerala?");
    assert_eq!(
        wheat,
        vec!["Wheat production data covers Haryana, Karnataka and Punjab (2019-2023). \
              Try asking about wheat production in Haryana."
            .to_string()]
    );

    let rainfall = notes("Compare rainfall in Punjab and Goa");
    assert_eq!(
        rainfall,
        vec!["Rainfall data covers Haryana, Karnataka, Kerala, Maharashtra and Punjab (2019-2023). \
              Try asking about rainfall in Haryana."
            .to_string()]
    );

    let early = notes("Average rainfall in Kerala between 2019 and 2021");
    assert_eq!(early, vec!["Rainfall rows for Kerala cover 2022-2023 only.".to_string()]);

    // Answered questions carry no coverage guidance.
    assert!(notes("Compare rainfall in Punjab and Haryana").is_empty());
}

#[test]
fn test_average_production_agrees_across_routines() {
    let engine = engine();
    // Punjab Wheat yearly totals: 300, 300, 300, 300 and 300 + 200.
    let query = engine
        .ask("What is the average Wheat production in Punjab between 2019 and 2023?")
        .unwrap();
    assert_eq!(query.intent.category, QueryCategory::ProductionQuery);
    let comparison = engine
        .ask("Compare Wheat production in Punjab and Haryana between 2019 and 2023")
        .unwrap();
    assert_eq!(comparison.intent.category, QueryCategory::ProductionComparison);

    let label = "avg Wheat production in Punjab (2019-2023)";
    let from_query = query.result.finding(label).expect("query finding");
    let from_comparison = comparison.result.finding(label).expect("comparison finding");
    assert_eq!(from_query.value.as_number(), Some(340.0));
    assert_eq!(from_comparison.value.as_number(), Some(340.0));
}

#[test]
fn test_missing_state_in_comparison_keeps_the_other() {
    let answer = engine().ask("Compare rainfall in Punjab and Goa").unwrap();

    assert_eq!(answer.result.findings.len(), 2);
    assert!(answer.result.findings[0].value.is_available());
    assert!(!answer.result.findings[1].value.is_available());
    assert!(answer.result.is_fully_cited());
}

#[test]
fn test_missing_column_is_schema_error() {
    let crops = crop_df().drop("production_tonnes").unwrap();
    let engine = engine_with(Datasets::new(crops, rainfall_df()));

    let err = engine
        .ask("Which state has the highest Sugarcane production?")
        .unwrap_err();
    assert!(err.is_schema_violation());

    // Questions that read no crop data are unaffected.
    assert!(engine.ask("Compare rainfall in Punjab and Haryana").is_ok());
    assert!(engine.ask("asdkjasd random text").is_ok());
}

#[test]
fn test_every_finding_is_cited() {
    let engine = engine();
    let questions = [
        "What is the average Wheat production in Karnataka over the last 3 years?",
        "Compare rainfall in Punjab and Haryana with their main crops",
        "Which state has the highest Sugarcane production?",
        "Top 2 districts for Wheat in Haryana",
        "How has Rice production changed in Punjab over the last decade?",
        "How does rainfall correlate with Rice production in Kerala?",
        "Give arguments to promote drought-resistant crops in Maharashtra",
        "Compare Wheat production in Punjab and Haryana",
        "Average rainfall in Karnataka between 2019 and 2023",
    ];
    for question in questions {
        let answer = engine.ask(question).unwrap();
        assert!(!answer.result.findings.is_empty(), "{}", question);
        assert!(answer.result.is_fully_cited(), "{}", question);
        for finding in &answer.result.findings {
            for marker in &finding.citations {
                assert!(
                    answer.text.contains(&format!("[{}]", marker + 1)),
                    "{} missing marker for {}",
                    question,
                    finding.label
                );
            }
        }
    }
}

#[test]
fn test_full_pipeline_is_deterministic() {
    let question = "Compare Wheat production in Punjab and Haryana";
    let first = engine().ask(question).unwrap();
    let second = engine_with(datasets()).ask(question).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.intent.category, QueryCategory::ProductionComparison);
}

#[test]
fn test_unknown_category_falls_back_to_production() {
    let intent: QueryIntent = serde_json::from_str(
        r#"{"category":"soil_quality","states":["Punjab"],"districts":[],"crops":["Wheat"],
            "year_range":null,"top_n":null,"raw_text":"soil in Punjab"}"#,
    )
    .unwrap();
    let result = engine().process(&intent).unwrap();
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].kind, FindingKind::AverageProduction);
}
