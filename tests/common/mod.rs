#![allow(dead_code)]

use agri_insight::catalog::EntityCatalog;
use agri_insight::config::AnalysisDefaults;
use agri_insight::dataset::Datasets;
use agri_insight::engine::QueryEngine;
use polars::prelude::*;
use std::sync::Arc;

pub const CROP_DATASET: &str = "crop_production";
pub const RAINFALL_DATASET: &str = "state_rainfall";

type CropRow = (&'static str, &'static str, &'static str, i64, f64);

fn crop_rows() -> Vec<CropRow> {
    let mut rows: Vec<CropRow> = Vec::new();
    let mut series = |state, district, crop, values: &[f64]| {
        for (offset, value) in values.iter().enumerate() {
            rows.push((state, district, crop, 2019 + offset as i64, *value));
        }
    };
    series("Karnataka", "Belagavi", "Wheat", &[100.0, 110.0, 120.0, 130.0, 140.0]);
    series("Punjab", "Ludhiana", "Wheat", &[300.0, 300.0, 300.0, 300.0, 300.0]);
    series("Punjab", "Ludhiana", "Rice", &[400.0, 420.0, 440.0, 460.0, 480.0]);
    series("Maharashtra", "Solapur", "Jowar", &[50.0, 55.0, 60.0, 65.0, 70.0]);
    series("Maharashtra", "Pune", "Bajra", &[30.0, 30.0, 30.0, 30.0, 30.0]);
    series("Kerala", "Palakkad", "Rice", &[80.0, 82.0, 84.0, 86.0, 88.0]);

    rows.extend([
        ("Punjab", "Amritsar", "Wheat", 2023, 200.0),
        ("Haryana", "Karnal", "Wheat", 2023, 250.0),
        ("Haryana", "Sirsa", "Wheat", 2023, 250.0),
        ("Haryana", "Hisar", "Wheat", 2023, 150.0),
        // Sugarcane totals tie: 500 each.
        ("Uttar Pradesh", "Meerut", "Sugarcane", 2023, 500.0),
        ("Maharashtra", "Kolhapur", "Sugarcane", 2022, 200.0),
        ("Maharashtra", "Kolhapur", "Sugarcane", 2023, 300.0),
        ("Karnataka", "Mandya", "Sugarcane", 2023, 100.0),
        ("Maharashtra", "Nashik", "Rice", 2023, 40.0),
    ]);
    rows
}

pub fn crop_df() -> DataFrame {
    let rows = crop_rows();
    df!(
        "state_name" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "district_name" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "crop_name" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        "year" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        "production_tonnes" => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
        "area_hectares" => rows.iter().map(|r| r.4 / 2.0).collect::<Vec<_>>()
    )
    .unwrap()
}

pub fn rainfall_df() -> DataFrame {
    let mut states = Vec::new();
    let mut years = Vec::new();
    let mut rainfall = Vec::new();
    let mut series = |state: &'static str, first_year: i64, values: &[f64]| {
        for (offset, value) in values.iter().enumerate() {
            states.push(state);
            years.push(first_year + offset as i64);
            rainfall.push(*value);
        }
    };
    series("Punjab", 2019, &[600.0, 620.0, 640.0, 660.0, 680.0]);
    series("Haryana", 2019, &[500.0, 520.0, 510.0, 530.0, 540.0]);
    series("Karnataka", 2019, &[1100.0, 1200.0, 1150.0, 1250.0, 1300.0]);
    series("Maharashtra", 2019, &[1000.0, 950.0, 900.0, 850.0, 800.0]);
    // Only two years overlap with Kerala's crop rows.
    series("Kerala", 2022, &[3000.0, 2900.0]);

    df!(
        "state_name" => states,
        "year" => years,
        "annual_rainfall_mm" => rainfall
    )
    .unwrap()
}

pub fn datasets() -> Datasets {
    Datasets::new(crop_df(), rainfall_df()).with_names(CROP_DATASET, RAINFALL_DATASET)
}

pub fn engine_with(datasets: Datasets) -> QueryEngine {
    QueryEngine::new(
        Arc::new(EntityCatalog::builtin().unwrap()),
        datasets,
        AnalysisDefaults::default(),
    )
}

pub fn engine() -> QueryEngine {
    engine_with(datasets())
}
