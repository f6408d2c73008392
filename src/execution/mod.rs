//! Execution Module - routing of intents and the result they produce

pub mod result;
pub mod router;

pub use result::{Citation, Finding, FindingKind, FindingValue, NarrativeHint, QueryResult};
pub use router::{process, route, Routine};
