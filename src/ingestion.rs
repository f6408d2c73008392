//! CSV loading for the crop and rainfall tables.
//!
//! Source files spell their columns in many ways ("Crop_Year", "Production",
//! "ANNUAL"). Loading lowercases every header, renames known spellings to
//! the names the tables expect and trims whitespace from string cells.
//! Schema validation itself happens later, when a routine opens the table.

use crate::dataset::{
    AREA_COL, CROP_COL, DISTRICT_COL, PRODUCTION_COL, RAINFALL_COL, STATE_COL, YEAR_COL,
};
use crate::error::{AgriError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Source spellings (already lowercased) and the column they become.
const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("state", STATE_COL),
    ("district", DISTRICT_COL),
    ("crop", CROP_COL),
    ("crop_year", YEAR_COL),
    ("production", PRODUCTION_COL),
    ("area", AREA_COL),
    ("annual_rainfall", RAINFALL_COL),
    ("annual", RAINFALL_COL),
];

fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AgriError::Ingestion(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    info!("Loading CSV: {}", path.display());
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .map_err(|e| AgriError::Ingestion(format!("Failed to load CSV {}: {}", path.display(), e)))?
        .collect()?;
    let df = harmonize_columns(df)?;
    info!(rows = df.height(), columns = df.width(), "Loaded {}", path.display());
    Ok(df)
}

pub fn load_crop_data(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_csv(path.as_ref())
}

pub fn load_rainfall_data(path: impl AsRef<Path>) -> Result<DataFrame> {
    load_csv(path.as_ref())
}

/// Lowercase headers, apply [`COLUMN_ALIASES`] and trim string cells.
///
/// An alias is only applied when its target column is not already present.
pub fn harmonize_columns(mut df: DataFrame) -> Result<DataFrame> {
    let original: Vec<String> = df.get_column_names().iter().map(|c| c.to_string()).collect();
    for name in &original {
        let lower = name.trim().to_lowercase().replace(' ', "_");
        if &lower != name && !df.get_column_names().contains(&lower.as_str()) {
            df.rename(name, &lower)?;
        }
    }

    for (alias, target) in COLUMN_ALIASES {
        let names = df.get_column_names();
        if names.contains(alias) && !names.contains(target) {
            debug!(from = alias, to = target, "Renaming column");
            df.rename(alias, target)?;
        }
    }

    let string_columns: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| s.dtype() == &DataType::String)
        .map(|s| s.name().to_string())
        .collect();
    for name in string_columns {
        let trimmed: StringChunked = df
            .column(&name)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::trim))
            .collect();
        df.replace(&name, trimmed.with_name(&name).into_series())?;
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harmonize_source_spellings() {
        let df = df! {
            "State" => &["Punjab "],
            "District" => &[" Ludhiana"],
            "Crop" => &["Wheat"],
            "Crop_Year" => &[2020i64],
            "Production" => &[100.0],
            "Area" => &[10.0],
        }
        .unwrap();

        let df = harmonize_columns(df).unwrap();
        let names = df.get_column_names();
        for expected in [STATE_COL, DISTRICT_COL, CROP_COL, YEAR_COL, PRODUCTION_COL, AREA_COL] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
        let state = df.column(STATE_COL).unwrap().str().unwrap().get(0);
        assert_eq!(state, Some("Punjab"));
        let district = df.column(DISTRICT_COL).unwrap().str().unwrap().get(0);
        assert_eq!(district, Some("Ludhiana"));
    }

    #[test]
    fn test_existing_target_column_is_kept() {
        let df = df! {
            "state_name" => &["Punjab"],
            "state" => &["PB"],
            "year" => &[2020i64],
            "ANNUAL" => &[640.0],
        }
        .unwrap();

        let df = harmonize_columns(df).unwrap();
        let state = df.column(STATE_COL).unwrap().str().unwrap().get(0);
        assert_eq!(state, Some("Punjab"));
        assert!(df.get_column_names().contains(&RAINFALL_COL));
    }

    #[test]
    fn test_missing_file_is_ingestion_error() {
        let err = load_crop_data("/nonexistent/crops.csv").unwrap_err();
        assert!(matches!(err, AgriError::Ingestion(_)));
    }
}
