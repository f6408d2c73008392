//! Query Engine - question in, cited answer out
//!
//! Owns the read-only catalog and datasets for a session and runs each
//! question through parse, route, process and format to completion.

use crate::catalog::EntityCatalog;
use crate::config::{AnalysisDefaults, EngineConfig};
use crate::dataset::Datasets;
use crate::error::{AgriError, Result};
use crate::execution::result::QueryResult;
use crate::execution::router::{route, Routine};
use crate::formatter::ResponseFormatter;
use crate::ingestion;
use crate::intent::QueryIntent;
use crate::parser::QueryParser;
use crate::routines::ProcessingContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything produced for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub intent: QueryIntent,
    pub routine: Routine,
    pub result: QueryResult,
    /// Markdown with inline citation markers
    pub text: String,
}

pub struct QueryEngine {
    catalog: Arc<EntityCatalog>,
    datasets: Datasets,
    defaults: AnalysisDefaults,
    parser: QueryParser,
    formatter: ResponseFormatter,
}

impl QueryEngine {
    pub fn new(catalog: Arc<EntityCatalog>, datasets: Datasets, defaults: AnalysisDefaults) -> Self {
        let parser = QueryParser::new(catalog.clone()).with_default_top_n(defaults.top_n);
        Self {
            catalog,
            datasets,
            defaults,
            parser,
            formatter: ResponseFormatter::new(),
        }
    }

    /// Load the catalog and both CSVs named by the config.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let catalog = match &config.catalog {
            Some(path) => EntityCatalog::load(path)?,
            None => EntityCatalog::builtin()?,
        };
        let crop_path = config
            .crop_data
            .as_ref()
            .ok_or_else(|| AgriError::Config("crop_data path is not set".to_string()))?;
        let rainfall_path = config
            .rainfall_data
            .as_ref()
            .ok_or_else(|| AgriError::Config("rainfall_data path is not set".to_string()))?;

        let datasets = Datasets::new(
            ingestion::load_crop_data(crop_path)?,
            ingestion::load_rainfall_data(rainfall_path)?,
        )
        .with_names(&config.crop_dataset_name, &config.rainfall_dataset_name);

        info!(
            catalog_version = catalog.version(),
            crop_rows = datasets.crops.height(),
            rainfall_rows = datasets.rainfall.height(),
            "Query engine ready"
        );
        Ok(Self::new(Arc::new(catalog), datasets, config.defaults.clone()))
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }

    pub fn defaults(&self) -> &AnalysisDefaults {
        &self.defaults
    }

    pub fn parse(&self, question: &str) -> QueryIntent {
        self.parser.parse(question)
    }

    /// Run the routine for an already parsed intent.
    pub fn process(&self, intent: &QueryIntent) -> Result<QueryResult> {
        let ctx = ProcessingContext::new(&self.datasets, &self.catalog, &self.defaults);
        route(intent).run(&ctx, intent)
    }

    /// Parse, route, process and format one question.
    ///
    /// The only error is a schema violation in one of the datasets.
    pub fn ask(&self, question: &str) -> Result<Answer> {
        let intent = self.parse(question);
        let routine = route(&intent);
        let ctx = ProcessingContext::new(&self.datasets, &self.catalog, &self.defaults);
        let result = routine.run(&ctx, &intent).map_err(|e| {
            warn!(routine = %routine, error = %e, "Routine failed");
            e
        })?;
        let text = self.formatter.format(&result);
        info!(
            category = %intent.category,
            findings = result.findings.len(),
            citations = result.citations.len(),
            "Answered question"
        );
        Ok(Answer {
            intent,
            routine,
            result,
            text,
        })
    }
}
