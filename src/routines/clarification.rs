//! Clarification: no data is read, only the parser's request is relayed.

use crate::ambiguity::EXAMPLE_QUESTIONS;
use crate::execution::result::{NarrativeHint, QueryResult};
use crate::intent::QueryIntent;
use tracing::debug;

/// Zero findings. The hints carry the consolidated question, one entry per
/// missing piece, and example questions.
pub fn process_clarification(intent: &QueryIntent) -> QueryResult {
    let mut result = QueryResult::new();

    match &intent.clarification {
        Some(request) => {
            result.hint(NarrativeHint::Question {
                text: request.question.clone(),
            });
            for piece in &request.missing_pieces {
                result.hint(NarrativeHint::MissingInformation {
                    field: piece.field.clone(),
                    description: piece.description.clone(),
                    suggestions: piece.suggestions.clone(),
                });
            }
            result.hint(NarrativeHint::Examples {
                questions: request.examples.clone(),
            });
        }
        None => {
            // Intent built by hand without a request.
            result.hint(NarrativeHint::Question {
                text: "Could you rephrase your question with a state, crop or time period?"
                    .to_string(),
            });
            result.hint(NarrativeHint::Examples {
                questions: EXAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            });
        }
    }

    debug!(hints = result.narrative_hints.len(), "clarification processed");
    result
}
