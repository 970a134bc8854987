#![forbid(unsafe_code)]

//! # survey-guru
//!
//! Synthesizes plausible questionnaire responses.
//!
//! A survey is a graph: questions own ordered options, and weighted
//! DIRECT/INVERSE connections say how one question's answer should pull on
//! another's. Each synthetic respondent walks the questions in a fixed order
//! (higher priority and better-connected questions first). For every
//! question the accumulated influence of the already-answered neighbours
//! narrows a 0–100 draw window, and the draw lands on an option by its rank
//! among the question's option values.
//!
//! Loading definitions ([`loader`]) and writing results ([`export`]) are
//! thin collaborators around the core; the core itself never logs.

pub mod distribution;
pub mod error;
pub mod export;
pub mod guru;
pub mod loader;
pub mod ordering;
pub mod population;
pub mod strategy;
pub mod survey;

pub use distribution::{bias_distribution, OptionBias, SamplingPolicy};
pub use error::SurveyError;
pub use guru::{sampling_window, Form, Guru};
pub use ordering::OrderingPolicy;
pub use population::{
    simulate, to_export_rows, ExportTable, Population, SimulationConfig,
};
pub use strategy::StrategyRegistry;
pub use survey::{
    AnswerOption, Connection, EffectType, OptionValue, Question, QuestionId, QuestionPriority,
    Survey,
};
