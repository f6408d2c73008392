//! Typed, read-only views over the crop and rainfall tables.
//!
//! Each view validates its frame's schema once, then answers row selections
//! with a lazy `polars` filter. Selected rows are materialized as records so
//! routines can aggregate them and cite exactly what they used.

use crate::error::{AgriError, Result};
use crate::time::YearRange;
use itertools::izip;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const STATE_COL: &str = "state_name";
pub const DISTRICT_COL: &str = "district_name";
pub const CROP_COL: &str = "crop_name";
pub const YEAR_COL: &str = "year";
pub const PRODUCTION_COL: &str = "production_tonnes";
pub const AREA_COL: &str = "area_hectares";
pub const RAINFALL_COL: &str = "annual_rainfall_mm";
pub const MONSOON_MONTHS: [&str; 4] = ["jun", "jul", "aug", "sep"];

pub const DEFAULT_CROP_DATASET: &str =
    "District-wise, Season-wise Crop Production Statistics (Ministry of Agriculture & Farmers Welfare)";
pub const DEFAULT_RAINFALL_DATASET: &str =
    "State-wise Annual Rainfall (India Meteorological Department)";

/// Both input tables plus the names used when citing them.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub crops: DataFrame,
    pub rainfall: DataFrame,
    pub crop_dataset_name: String,
    pub rainfall_dataset_name: String,
}

impl Datasets {
    pub fn new(crops: DataFrame, rainfall: DataFrame) -> Self {
        Self {
            crops,
            rainfall,
            crop_dataset_name: DEFAULT_CROP_DATASET.to_string(),
            rainfall_dataset_name: DEFAULT_RAINFALL_DATASET.to_string(),
        }
    }

    pub fn with_names(mut self, crop_dataset_name: &str, rainfall_dataset_name: &str) -> Self {
        self.crop_dataset_name = crop_dataset_name.to_string();
        self.rainfall_dataset_name = rainfall_dataset_name.to_string();
        self
    }

    pub fn crop_table(&self) -> Result<CropTable<'_>> {
        CropTable::new(&self.crops, &self.crop_dataset_name)
    }

    pub fn rainfall_table(&self) -> Result<RainfallTable<'_>> {
        RainfallTable::new(&self.rainfall, &self.rainfall_dataset_name)
    }
}

/// Row selection shared by both tables. Empty lists mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub states: Vec<String>,
    pub districts: Vec<String>,
    pub crops: Vec<String>,
    pub years: Option<YearRange>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: &str) -> Self {
        self.states = vec![state.to_string()];
        self
    }

    pub fn states(mut self, states: &[String]) -> Self {
        self.states = states.to_vec();
        self
    }

    pub fn district(mut self, district: &str) -> Self {
        self.districts = vec![district.to_string()];
        self
    }

    pub fn districts(mut self, districts: &[String]) -> Self {
        self.districts = districts.to_vec();
        self
    }

    pub fn crop(mut self, crop: &str) -> Self {
        self.crops = vec![crop.to_string()];
        self
    }

    pub fn crops(mut self, crops: &[String]) -> Self {
        self.crops = crops.to_vec();
        self
    }

    pub fn years(mut self, years: Option<YearRange>) -> Self {
        self.years = years;
        self
    }

    /// Human-readable selector, e.g.
    /// `state_name = Karnataka AND crop_name = Wheat AND year 2021-2023`.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        for (column, values) in [
            (STATE_COL, &self.states),
            (DISTRICT_COL, &self.districts),
            (CROP_COL, &self.crops),
        ] {
            match values.len() {
                0 => {}
                1 => parts.push(format!("{} = {}", column, values[0])),
                _ => parts.push(format!("{} in ({})", column, values.join(", "))),
            }
        }
        if let Some(range) = self.years {
            parts.push(format!("{} {}", YEAR_COL, range));
        }
        if parts.is_empty() {
            "all rows".to_string()
        } else {
            parts.join(" AND ")
        }
    }

    fn predicate(&self, with_district_and_crop: bool) -> Expr {
        let mut predicate = lit(true);
        if let Some(expr) = any_name(STATE_COL, &self.states) {
            predicate = predicate.and(expr);
        }
        if with_district_and_crop {
            if let Some(expr) = any_name(DISTRICT_COL, &self.districts) {
                predicate = predicate.and(expr);
            }
            if let Some(expr) = any_name(CROP_COL, &self.crops) {
                predicate = predicate.and(expr);
            }
        }
        if let Some(range) = self.years {
            let year = col(YEAR_COL).cast(DataType::Int64);
            predicate = predicate
                .and(year.clone().gt_eq(lit(range.start as i64)))
                .and(year.lt_eq(lit(range.end as i64)));
        }
        predicate
    }
}

/// Case-insensitive match of a name column against any of `names`.
fn any_name(column: &str, names: &[String]) -> Option<Expr> {
    names
        .iter()
        .map(|name| {
            col(column)
                .str()
                .to_lowercase()
                .eq(lit(name.trim().to_lowercase()))
        })
        .reduce(|a, b| a.or(b))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    pub state: String,
    pub district: String,
    pub crop: String,
    pub year: i32,
    pub production_tonnes: f64,
    pub area_hectares: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallRecord {
    pub state: String,
    pub year: i32,
    pub annual_rainfall_mm: f64,
    /// June-September total, when the table carries month columns.
    pub monsoon_mm: Option<f64>,
}

pub struct CropTable<'a> {
    df: &'a DataFrame,
    name: &'a str,
}

impl<'a> CropTable<'a> {
    pub fn new(df: &'a DataFrame, name: &'a str) -> Result<Self> {
        validate_non_empty(df, name)?;
        for column in [STATE_COL, DISTRICT_COL, CROP_COL] {
            require_string(df, name, column)?;
        }
        require_year(df, name)?;
        require_numeric(df, name, PRODUCTION_COL)?;
        require_numeric(df, name, AREA_COL)?;
        Ok(Self { df, name })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn max_year(&self) -> Result<Option<i32>> {
        max_year(self.df)
    }

    pub fn select(&self, filter: &RowFilter) -> Result<Vec<CropRecord>> {
        let out = self
            .df
            .clone()
            .lazy()
            .filter(filter.predicate(true))
            .collect()?;

        let years = out.column(YEAR_COL)?.cast(&DataType::Int64)?;
        let production = out.column(PRODUCTION_COL)?.cast(&DataType::Float64)?;
        let area = out.column(AREA_COL)?.cast(&DataType::Float64)?;

        let records = izip!(
            out.column(STATE_COL)?.str()?.into_iter(),
            out.column(DISTRICT_COL)?.str()?.into_iter(),
            out.column(CROP_COL)?.str()?.into_iter(),
            years.i64()?.into_iter(),
            production.f64()?.into_iter(),
            area.f64()?.into_iter()
        )
        .filter_map(|(state, district, crop, year, production, area)| {
            Some(CropRecord {
                state: state?.trim().to_string(),
                district: district?.trim().to_string(),
                crop: crop?.trim().to_string(),
                year: year? as i32,
                production_tonnes: production?,
                area_hectares: area,
            })
        })
        .collect::<Vec<_>>();

        if records.len() < out.height() {
            warn!(
                dataset = %self.name,
                skipped = out.height() - records.len(),
                "Skipped crop rows with missing values"
            );
        }
        Ok(records)
    }
}

pub struct RainfallTable<'a> {
    df: &'a DataFrame,
    name: &'a str,
    has_monsoon: bool,
}

impl<'a> RainfallTable<'a> {
    pub fn new(df: &'a DataFrame, name: &'a str) -> Result<Self> {
        validate_non_empty(df, name)?;
        require_string(df, name, STATE_COL)?;
        require_year(df, name)?;
        require_numeric(df, name, RAINFALL_COL)?;

        let present = df.get_column_names();
        let has_monsoon = MONSOON_MONTHS.iter().all(|m| present.contains(m));
        if has_monsoon {
            for month in MONSOON_MONTHS {
                require_numeric(df, name, month)?;
            }
        }
        Ok(Self {
            df,
            name,
            has_monsoon,
        })
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn has_monsoon_columns(&self) -> bool {
        self.has_monsoon
    }

    pub fn max_year(&self) -> Result<Option<i32>> {
        max_year(self.df)
    }

    /// Rows for the filter's states and years; district and crop filters do
    /// not apply to rainfall.
    pub fn select(&self, filter: &RowFilter) -> Result<Vec<RainfallRecord>> {
        let out = self
            .df
            .clone()
            .lazy()
            .filter(filter.predicate(false))
            .collect()?;

        let years = out.column(YEAR_COL)?.cast(&DataType::Int64)?;
        let rainfall = out.column(RAINFALL_COL)?.cast(&DataType::Float64)?;
        let monsoon = if self.has_monsoon {
            Some(monsoon_totals(&out)?)
        } else {
            None
        };

        let mut records = Vec::with_capacity(out.height());
        for (idx, (state, year, annual)) in izip!(
            out.column(STATE_COL)?.str()?.into_iter(),
            years.i64()?.into_iter(),
            rainfall.f64()?.into_iter()
        )
        .enumerate()
        {
            if let (Some(state), Some(year), Some(annual)) = (state, year, annual) {
                records.push(RainfallRecord {
                    state: state.trim().to_string(),
                    year: year as i32,
                    annual_rainfall_mm: annual,
                    monsoon_mm: monsoon.as_ref().and_then(|m| m[idx]),
                });
            }
        }

        if records.len() < out.height() {
            warn!(
                dataset = %self.name,
                skipped = out.height() - records.len(),
                "Skipped rainfall rows with missing values"
            );
        }
        Ok(records)
    }
}

fn monsoon_totals(df: &DataFrame) -> Result<Vec<Option<f64>>> {
    let mut totals: Vec<Option<f64>> = vec![Some(0.0); df.height()];
    for month in MONSOON_MONTHS {
        let series = df.column(month)?.cast(&DataType::Float64)?;
        for (total, value) in totals.iter_mut().zip(series.f64()?.into_iter()) {
            *total = match (*total, value) {
                (Some(sum), Some(v)) => Some(sum + v),
                _ => None,
            };
        }
    }
    Ok(totals)
}

fn max_year(df: &DataFrame) -> Result<Option<i32>> {
    let years = df.column(YEAR_COL)?.cast(&DataType::Int64)?;
    Ok(years.i64()?.max().map(|y| y as i32))
}

fn validate_non_empty(df: &DataFrame, dataset: &str) -> Result<()> {
    if df.height() == 0 {
        return Err(AgriError::schema(dataset, "dataset has no rows"));
    }
    Ok(())
}

fn column_dtype(df: &DataFrame, dataset: &str, column: &str) -> Result<DataType> {
    df.column(column)
        .map(|s| s.dtype().clone())
        .map_err(|_| {
            warn!(dataset = %dataset, column = %column, "Required column missing");
            AgriError::schema(dataset, format!("missing required column '{}'", column))
        })
}

fn require_string(df: &DataFrame, dataset: &str, column: &str) -> Result<()> {
    match column_dtype(df, dataset, column)? {
        DataType::String => Ok(()),
        other => Err(AgriError::schema(
            dataset,
            format!("column '{}' must be text, found {}", column, other),
        )),
    }
}

fn require_numeric(df: &DataFrame, dataset: &str, column: &str) -> Result<()> {
    let dtype = column_dtype(df, dataset, column)?;
    if dtype.is_numeric() {
        Ok(())
    } else {
        Err(AgriError::schema(
            dataset,
            format!("column '{}' must be numeric, found {}", column, dtype),
        ))
    }
}

/// `year` may be an integer column or integer-parsable text.
fn require_year(df: &DataFrame, dataset: &str) -> Result<()> {
    let dtype = column_dtype(df, dataset, YEAR_COL)?;
    if dtype.is_integer() {
        return Ok(());
    }
    if dtype == DataType::String {
        let parsed = df.column(YEAR_COL)?.cast(&DataType::Int64)?;
        let original_nulls = df.column(YEAR_COL)?.null_count();
        if parsed.null_count() == original_nulls {
            return Ok(());
        }
        return Err(AgriError::schema(
            dataset,
            format!("column '{}' contains values that are not integer years", YEAR_COL),
        ));
    }
    Err(AgriError::schema(
        dataset,
        format!("column '{}' must be an integer year, found {}", YEAR_COL, dtype),
    ))
}
