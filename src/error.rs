use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgriError {
    /// A dataset handed to a routine is missing a required column or the
    /// column has the wrong type.
    #[error("Schema error in {dataset}: {message}")]
    Schema { dataset: String, message: String },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl AgriError {
    pub fn schema(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        AgriError::Schema {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// True for precondition failures on the input datasets.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, AgriError::Schema { .. })
    }
}

impl From<polars::error::PolarsError> for AgriError {
    fn from(err: polars::error::PolarsError) -> Self {
        AgriError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgriError>;
