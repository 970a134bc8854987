//! Survey graph: questions, their options, and the weighted influence
//! connections between question pairs.
//!
//! A `Survey` is built once (usually through [`Survey::from_definition`]) and
//! treated as read-only afterwards. Connections are undirected: adding one
//! stores the same `Connection` value on both endpoints.

pub mod definition;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SurveyError;
use crate::ordering::{OrderingPolicy, PriorityThenDegree};

pub use definition::{ConnectionDefinition, OptionDefinition, QuestionDefinition, SurveyDefinition};

/// Question identifier, unique within a survey.
pub type QuestionId = i64;

/// Total probability mass on the 0–100 sampling scale.
pub const PROBABILITY_SCALE: f64 = 100.0;

// =============================================================================
// Enumerations
// =============================================================================

/// How strongly a question should be resolved early in the simulation walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPriority {
    Low,
    #[default]
    Normal,
    Medium,
    High,
}

impl QuestionPriority {
    const NAMES: [&'static str; 4] = ["low", "normal", "medium", "high"];

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::Low),
            1 => Some(Self::Normal),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            _ => None,
        }
    }
}

/// Directional sense in which a connection propagates a peer's bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    #[default]
    None,
    Direct,
    Inverse,
}

impl EffectType {
    const NAMES: [&'static str; 3] = ["none", "direct", "inverse"];

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::Direct),
            2 => Some(Self::Inverse),
            _ => None,
        }
    }

    /// Multiplier applied to a peer's bias.
    pub fn sign(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Direct => 1.0,
            Self::Inverse => -1.0,
        }
    }
}

/// Definitions write levels either as their integer code or as a name.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Code(i64),
    Name(String),
}

fn level_from_repr<T>(
    repr: LevelRepr,
    names: &[&str],
    from_level: fn(i64) -> Option<T>,
    kind: &str,
) -> Result<T, String> {
    match repr {
        LevelRepr::Code(code) => from_level(code).ok_or_else(|| format!("invalid {kind} {code}")),
        LevelRepr::Name(name) => names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name.trim()))
            .and_then(|idx| from_level(idx as i64))
            .ok_or_else(|| format!("invalid {kind} {name:?}")),
    }
}

impl<'de> Deserialize<'de> for QuestionPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = LevelRepr::deserialize(deserializer)?;
        level_from_repr(repr, &Self::NAMES, Self::from_level, "priority")
            .map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for EffectType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = LevelRepr::deserialize(deserializer)?;
        level_from_repr(repr, &Self::NAMES, Self::from_level, "effect")
            .map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Options
// =============================================================================

/// Comparable value attached to an option. Only relative rank matters.
///
/// Numbers order before text; numbers compare by `f64::total_cmp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Number(f64),
    Text(String),
}

impl Ord for OptionValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for OptionValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OptionValue {}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for OptionValue {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOption {
    pub name: String,
    pub value: OptionValue,
    /// Explicit share of the 0–100 probability scale, if allocated.
    pub probability: Option<f64>,
}

impl AnswerOption {
    pub fn new(name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            probability: None,
        }
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - ({})", self.name, self.value)
    }
}

// =============================================================================
// Connections and questions
// =============================================================================

/// Undirected influence between two questions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connection {
    pub weight: f64,
    pub effect: EffectType,
}

impl Connection {
    pub fn new(weight: f64, effect: EffectType) -> Self {
        Self { weight, effect }
    }
}

#[derive(Debug, Clone)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
    priority: QuestionPriority,
    connections: BTreeMap<QuestionId, Connection>,
    probability_left: f64,
    unprioritized: usize,
}

impl Question {
    /// Build a question. Fails if `options` is empty or the explicit option
    /// probabilities do not fit on the 0–100 scale.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
        priority: QuestionPriority,
    ) -> Result<Self, SurveyError> {
        if options.is_empty() {
            return Err(SurveyError::malformed(format!(
                "question {id} must have at least one option"
            )));
        }
        let mut question = Self {
            id,
            text: text.into(),
            options: Vec::with_capacity(options.len()),
            priority,
            connections: BTreeMap::new(),
            probability_left: PROBABILITY_SCALE,
            unprioritized: 0,
        };
        for option in options {
            question.add_option(option)?;
        }
        Ok(question)
    }

    /// Append an option, keeping the probability bookkeeping consistent.
    pub fn add_option(&mut self, option: AnswerOption) -> Result<(), SurveyError> {
        match option.probability {
            Some(p) => {
                if !p.is_finite() || p < 0.0 {
                    return Err(SurveyError::malformed(format!(
                        "option {:?} of question {} has invalid probability {p}",
                        option.name, self.id
                    )));
                }
                let left = self.probability_left - p;
                // Tolerate float noise from fractional allocations.
                if left < -1e-9 {
                    return Err(SurveyError::malformed(format!(
                        "allocated probability of question {} exceeds {PROBABILITY_SCALE}",
                        self.id
                    )));
                }
                self.probability_left = left.max(0.0);
            }
            None => self.unprioritized += 1,
        }
        self.options.push(option);
        Ok(())
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&AnswerOption> {
        self.options.get(index)
    }

    pub fn num_options(&self) -> usize {
        self.options.len()
    }

    pub fn priority(&self) -> QuestionPriority {
        self.priority
    }

    pub fn connections(&self) -> &BTreeMap<QuestionId, Connection> {
        &self.connections
    }

    /// Number of connected peer questions.
    pub fn degree(&self) -> usize {
        self.connections.len()
    }

    /// Probability mass not claimed by explicitly allocated options.
    pub fn probability_left(&self) -> f64 {
        self.probability_left
    }

    /// Number of options without an explicit probability.
    pub fn unprioritized_count(&self) -> usize {
        self.unprioritized
    }

    /// Option indices sorted ascending by value. Equal values keep their
    /// definition order.
    pub fn sorted_option_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.options.len()).collect();
        indices.sort_by(|&a, &b| self.options[a].value.cmp(&self.options[b].value));
        indices
    }

    fn connect(&mut self, peer: QuestionId, connection: Connection) {
        self.connections.insert(peer, connection);
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Question: {}", self.text)
    }
}

// =============================================================================
// Survey
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Survey {
    pub title: String,
    pub description: String,
    questions: BTreeMap<QuestionId, Question>,
}

impl Survey {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            questions: BTreeMap::new(),
        }
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), SurveyError> {
        if self.questions.contains_key(&question.id) {
            return Err(SurveyError::DuplicateId { id: question.id });
        }
        self.questions.insert(question.id, question);
        Ok(())
    }

    /// Connect two questions. The same `Connection` is stored on both sides;
    /// connecting an already-connected pair replaces the previous value.
    pub fn add_connection(
        &mut self,
        from: QuestionId,
        to: QuestionId,
        weight: f64,
        effect: EffectType,
    ) -> Result<(), SurveyError> {
        self.check_exists(from)?;
        self.check_exists(to)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(SurveyError::InvalidConnectionWeight { from, to, weight });
        }

        let connection = Connection::new(weight, effect);
        if let Some(q) = self.questions.get_mut(&from) {
            q.connect(to, connection);
        }
        if let Some(q) = self.questions.get_mut(&to) {
            q.connect(from, connection);
        }
        Ok(())
    }

    pub fn get_question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }

    pub fn check_exists(&self, id: QuestionId) -> Result<&Question, SurveyError> {
        self.questions
            .get(&id)
            .ok_or(SurveyError::UnknownQuestion { id })
    }

    /// Questions in ascending id order.
    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Number of distinct undirected connections.
    pub fn connection_count(&self) -> usize {
        self.questions
            .values()
            .flat_map(|q| q.connections.keys().map(move |&peer| (q.id, peer)))
            .filter(|&(id, peer)| id <= peer)
            .count()
    }

    /// Questions in the canonical simulation order: priority descending,
    /// connection count descending, id ascending.
    pub fn order_for_simulation(&self) -> Vec<&Question> {
        self.order_with(&PriorityThenDegree)
    }

    pub fn order_with(&self, policy: &dyn OrderingPolicy) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.values().collect();
        ordered.sort_by(|a, b| policy.compare(a, b));
        ordered
    }
}

impl fmt::Display for Survey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Survey: {}", self.title)
    }
}
