//! Engine configuration: data locations, citation names and analysis defaults.

use crate::dataset::{DEFAULT_CROP_DATASET, DEFAULT_RAINFALL_DATASET};
use crate::error::{AgriError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_CROP_DATA: &str = "AGRI_CROP_DATA";
pub const ENV_RAINFALL_DATA: &str = "AGRI_RAINFALL_DATA";
pub const ENV_CATALOG: &str = "AGRI_CATALOG";

/// Default windows and counts used when a question leaves them open.
///
/// A window of `Some(n)` means the n most recent years of the dataset the
/// routine reads; `None` means every available year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    /// Ranking size without an explicit N, and top crops per state
    pub top_n: u32,
    pub rainfall_comparison_years: Option<u32>,
    pub rainfall_query_years: Option<u32>,
    pub district_ranking_years: Option<u32>,
    pub state_ranking_years: Option<u32>,
    pub trend_years: Option<u32>,
    pub production_years: Option<u32>,
    pub comparison_years: Option<u32>,
    pub correlation_years: Option<u32>,
    pub policy_years: Option<u32>,
    pub policy_arguments: u32,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            top_n: 3,
            rainfall_comparison_years: Some(5),
            rainfall_query_years: Some(1),
            district_ranking_years: Some(1),
            state_ranking_years: None,
            trend_years: Some(10),
            production_years: Some(3),
            comparison_years: Some(5),
            correlation_years: None,
            policy_years: Some(5),
            policy_arguments: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Crop production CSV
    pub crop_data: Option<PathBuf>,
    /// Rainfall CSV
    pub rainfall_data: Option<PathBuf>,
    /// Catalog JSON; the embedded catalog is used when absent
    pub catalog: Option<PathBuf>,
    /// Names shown in citations
    pub crop_dataset_name: String,
    pub rainfall_dataset_name: String,
    pub defaults: AnalysisDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crop_data: None,
            rainfall_data: None,
            catalog: None,
            crop_dataset_name: DEFAULT_CROP_DATASET.to_string(),
            rainfall_dataset_name: DEFAULT_RAINFALL_DATASET.to_string(),
            defaults: AnalysisDefaults::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgriError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| AgriError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Override paths from `AGRI_CROP_DATA`, `AGRI_RAINFALL_DATA` and
    /// `AGRI_CATALOG` when set.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (key, slot) in [
            (ENV_CROP_DATA, &mut self.crop_data),
            (ENV_RAINFALL_DATA, &mut self.rainfall_data),
            (ENV_CATALOG, &mut self.catalog),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!(key = %key, value = %value, "Config override from environment");
                *slot = Some(PathBuf::from(value));
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.defaults.top_n == 0 {
            return Err(AgriError::Config("defaults.top_n must be at least 1".to_string()));
        }
        if self.defaults.policy_arguments == 0 {
            return Err(AgriError::Config(
                "defaults.policy_arguments must be at least 1".to_string(),
            ));
        }
        let windows = [
            ("rainfall_comparison_years", self.defaults.rainfall_comparison_years),
            ("rainfall_query_years", self.defaults.rainfall_query_years),
            ("district_ranking_years", self.defaults.district_ranking_years),
            ("state_ranking_years", self.defaults.state_ranking_years),
            ("trend_years", self.defaults.trend_years),
            ("production_years", self.defaults.production_years),
            ("comparison_years", self.defaults.comparison_years),
            ("correlation_years", self.defaults.correlation_years),
            ("policy_years", self.defaults.policy_years),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, years)| *years == Some(0)) {
            return Err(AgriError::Config(format!(
                "defaults.{} must be at least 1 year (or null for all years)",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"defaults": {"top_n": 5}, "crop_data": "crops.csv"}"#).unwrap();
        assert_eq!(config.defaults.top_n, 5);
        assert_eq!(config.defaults.production_years, Some(3));
        assert_eq!(config.defaults.state_ranking_years, None);
        assert_eq!(config.crop_data, Some(PathBuf::from("crops.csv")));
        assert_eq!(config.crop_dataset_name, DEFAULT_CROP_DATASET);
    }

    #[test]
    fn test_overrides() {
        let mut config = EngineConfig::default();
        config.apply_overrides(|key| match key {
            ENV_RAINFALL_DATA => Some("/data/rain.csv".to_string()),
            ENV_CATALOG => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.rainfall_data, Some(PathBuf::from("/data/rain.csv")));
        assert_eq!(config.catalog, None);
        assert_eq!(config.crop_data, None);
    }

    #[test]
    fn test_validate_rejects_zero_windows() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());
        config.defaults.trend_years = Some(0);
        assert!(matches!(config.validate(), Err(AgriError::Config(_))));
    }
}
