pub mod ambiguity;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod execution;
pub mod formatter;
pub mod fuzzy_matcher;
pub mod ingestion;
pub mod intent;
pub mod parser;
pub mod routines;
pub mod rules;
pub mod stats;
pub mod time;

pub use engine::{Answer, QueryEngine};
pub use error::{AgriError, Result};
pub use execution::result::QueryResult;
pub use intent::{QueryCategory, QueryIntent};
