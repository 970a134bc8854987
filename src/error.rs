//! Error taxonomy for the simulation core.
//!
//! Every variant is an input-data or programmer error. Nothing here is
//! transient, so callers surface them instead of retrying.

use thiserror::Error;

use crate::survey::QuestionId;

#[derive(Debug, Error, PartialEq)]
pub enum SurveyError {
    #[error("question {id} already in survey")]
    DuplicateId { id: QuestionId },

    #[error("question {id} does not exist")]
    UnknownQuestion { id: QuestionId },

    #[error("question {question_id} has no option at index {index}")]
    UnknownOption { question_id: QuestionId, index: usize },

    #[error("malformed survey definition: {reason}")]
    MalformedDefinition { reason: String },

    #[error("invalid weight {weight} on connection {from} -> {to}")]
    InvalidConnectionWeight {
        from: QuestionId,
        to: QuestionId,
        weight: f64,
    },

    /// The accumulated effect pushed the sampling window to zero width.
    #[error("sampling window [{min}, {max}) is empty for effect {effect}")]
    EmptyWindow { effect: i64, min: i64, max: i64 },

    #[error("no forms to export")]
    EmptyDataset,

    #[error("population size must be >= 0, got {size}")]
    InvalidPopulation { size: i64 },

    #[error("unknown {kind} strategy: {name}")]
    UnknownStrategy { kind: &'static str, name: String },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("simulation cancelled at respondent {respondent}")]
    Cancelled { respondent: usize },
}

impl SurveyError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDefinition {
            reason: reason.into(),
        }
    }
}
